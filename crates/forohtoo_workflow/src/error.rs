use forohtoo_schedule::ScheduleError;
use forohtoo_sse::AwaitError;
use forohtoo_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Await(#[from] AwaitError),
    #[error("payment workflow {0} not found")]
    NotFound(String),
}
