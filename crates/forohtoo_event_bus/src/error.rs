#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("failed to publish event: {0}")]
    Publish(String),
    #[error("failed to create consumer: {0}")]
    Consumer(String),
    #[error("failed to read next message: {0}")]
    Read(String),
    #[error("failed to ack message: {0}")]
    Ack(String),
    #[error("failed to decode event payload: {0}")]
    Decode(#[from] serde_json::Error),
}
