/// Errors surfaced to callers of the `Store` trait: the backend's native
/// error type wrapped behind `#[from]`, plus named variants for conditions
/// the caller needs to branch on.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Backend(#[from] sqlx::Error),
    #[error("registration {0} not found")]
    RegistrationNotFound(String),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("failed to decode a stored JSON column: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StorageError {
    /// Whether a caller (the Poller, the Schedule Plane reconciliation loop)
    /// can reasonably retry the same operation on its own next tick, versus
    /// a condition that needs operator attention. Connection-level failures
    /// are transient; anything else (constraint violations, bad migrations)
    /// is not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StorageError::Backend(sqlx::Error::PoolTimedOut)
            | StorageError::Backend(sqlx::Error::Io(_))
            | StorageError::Backend(sqlx::Error::PoolClosed) => true,
            StorageError::Backend(_) => false,
            StorageError::RegistrationNotFound(_) => false,
            StorageError::Migration(_) => false,
            StorageError::Decode(_) => false,
        }
    }
}
