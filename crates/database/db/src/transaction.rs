use super::{DatabaseConnectionProvider, DatabaseError};

use sea_orm::TransactionTrait;

/// A type that represents a database transaction.
///
/// This type is used to perform atomic operations on the database. Nested transactions are
/// backed by savepoints, which allows a single operation to be undone without aborting the outer
/// transaction.
#[derive(Debug)]
pub struct DatabaseTransaction {
    /// The underlying database transaction.
    tx: sea_orm::DatabaseTransaction,
}

impl DatabaseTransaction {
    /// Creates a new [`DatabaseTransaction`] instance associated with the provided
    /// [`sea_orm::DatabaseTransaction`].
    pub const fn new(tx: sea_orm::DatabaseTransaction) -> Self {
        Self { tx }
    }

    /// Begins a nested transaction, committed into or rolled back to the current one.
    pub async fn savepoint(&self) -> Result<Self, DatabaseError> {
        tracing::trace!(target: "sync::db", "Creating savepoint");
        Ok(Self::new(self.tx.begin().await?))
    }

    /// Commits the transaction.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        tracing::trace!(target: "sync::db", "Committing transaction");
        self.tx.commit().await?;
        Ok(())
    }

    /// Rolls back the transaction.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        tracing::trace!(target: "sync::db", "Rolling back transaction");
        self.tx.rollback().await?;
        Ok(())
    }
}

impl DatabaseConnectionProvider for DatabaseTransaction {
    type Connection = sea_orm::DatabaseTransaction;

    fn get_connection(&self) -> &Self::Connection {
        &self.tx
    }
}
