use forohtoo_event_bus::EventBusError;
use forohtoo_rpc_oracle::OracleError;
use forohtoo_storage::StorageError;

/// One poll cycle's failure modes (spec.md §4.3), split by `is_recoverable`:
/// a recoverable error means the next scheduled tick is expected to succeed
/// on its own; anything else is surfaced so the schedule plane can flag the
/// registration.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("registration not found for this poll cycle")]
    RegistrationNotFound,
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    EventBus(#[from] EventBusError),
}

impl PollerError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            PollerError::RegistrationNotFound => false,
            PollerError::Oracle(e) => e.is_recoverable(),
            PollerError::Storage(e) => e.is_recoverable(),
            // A publish failure after the Store write has already landed is
            // always worth retrying on the next cycle: nothing about the
            // oracle data changed, and consumers are idempotent.
            PollerError::EventBus(_) => true,
        }
    }
}
