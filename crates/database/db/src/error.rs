/// The error type for database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A database error occurred.
    #[error("database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
    /// A batch was not found in the database.
    #[error("batch {0} not found in database")]
    BatchNotFound(u64),
    /// A forced batch was not found in the database.
    #[error("forced batch {0} not found in database")]
    ForcedBatchNotFound(u64),
    /// The rollup parameters were not initialized.
    #[error("rollup parameters not found in database")]
    ParametersNotFound,
    /// A number does not fit the storage representation.
    #[error("value {0} exceeds the storage range")]
    OutOfRange(u64),
}
