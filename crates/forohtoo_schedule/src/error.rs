use forohtoo_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("schedule runtime failure: {0}")]
    Runtime(String),
}

impl ScheduleError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            ScheduleError::Storage(e) => e.is_recoverable(),
            ScheduleError::Runtime(_) => true,
        }
    }
}
