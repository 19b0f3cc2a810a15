use crate::{pending::PendingStateLedger, sequencing::check_hash_chain, QueryError};

use alloy_primitives::{B256, U256};
use rollup_sync_db::{Database, DatabaseError, DatabaseOperations};
use rollup_sync_primitives::{PendingState, RollupParameters};
use std::sync::Arc;

/// A read-only view of the committed ledger, for the consumers of the synchronized state.
///
/// Reads never observe a block that is being applied. Missing data is reported as `None`, errors
/// are reserved for invalid inputs and storage failures.
#[derive(Debug, Clone)]
pub struct LedgerReader {
    database: Arc<Database>,
}

impl LedgerReader {
    /// Returns a new [`LedgerReader`] over the database.
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Returns the last batch with a confirmed state root.
    pub async fn last_verified_batch(&self) -> Result<u64, QueryError> {
        Ok(self.database.get_last_verified_batch().await?)
    }

    /// Returns the last verified batch, counting the batches of pending states.
    pub async fn last_verified_batch_including_pending(&self) -> Result<u64, QueryError> {
        Ok(PendingStateLedger::new(self.database.as_ref())
            .last_verified_batch_including_pending()
            .await?)
    }

    /// Returns the confirmed state root of the batch. Roots of pending states are not returned.
    pub async fn state_root(&self, batch_number: u64) -> Result<Option<B256>, QueryError> {
        match self.database.get_state_root(batch_number).await {
            Err(DatabaseError::OutOfRange(number)) => Err(QueryError::InvalidBatchNumber(number)),
            result => Ok(result?),
        }
    }

    /// Returns the current batch fee.
    pub async fn current_batch_fee(&self) -> Result<U256, QueryError> {
        Ok(self.rollup_parameters().await?.batch_fee)
    }

    /// Returns true if the emergency state is active.
    pub async fn is_emergency_state(&self) -> Result<bool, QueryError> {
        Ok(self.database.get_emergency_state().await?.is_active)
    }

    /// Returns the active pending states numbered above `since`, in ascending order.
    pub async fn pending_states(&self, since: u64) -> Result<Vec<PendingState>, QueryError> {
        match self.database.get_active_pending_states(since).await {
            Err(DatabaseError::OutOfRange(number)) => Err(QueryError::InvalidBatchNumber(number)),
            result => Ok(result?),
        }
    }

    /// Returns true if the pending state can be consolidated at `now`.
    pub async fn is_consolidable(
        &self,
        pending_state_number: u64,
        now: u64,
    ) -> Result<bool, QueryError> {
        let timeout = self.rollup_parameters().await?.pending_state_timeout;
        match PendingStateLedger::new(self.database.as_ref())
            .is_consolidable(pending_state_number, now, timeout)
            .await
        {
            Err(DatabaseError::OutOfRange(number)) => Err(QueryError::InvalidBatchNumber(number)),
            result => Ok(result?),
        }
    }

    /// Returns the current rollup parameters.
    pub async fn rollup_parameters(&self) -> Result<RollupParameters, QueryError> {
        Ok(self.database.get_rollup_parameters().await?.ok_or(DatabaseError::ParametersNotFound)?)
    }

    /// Recomputes the accumulated input hash of every sequenced batch and checks it against the
    /// stored one.
    pub async fn check_hash_chain(&self) -> Result<(), QueryError> {
        let last =
            self.database.get_last_batch().await?.map(|b| b.batch_number).unwrap_or_default();
        Ok(check_hash_chain(self.database.as_ref(), 1, last).await?)
    }
}
