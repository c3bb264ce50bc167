use forohtoo_event_bus::EventBusError;
use forohtoo_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum SseError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    EventBus(#[from] EventBusError),
}

#[derive(Debug, thiserror::Error)]
pub enum AwaitError {
    #[error(transparent)]
    Sse(#[from] SseError),
    #[error("await_transaction timed out before a matching transaction arrived")]
    DeadlineExceeded,
}
