use async_trait::async_trait;

use crate::error::EventBusError;
use crate::event::{DeliverPolicy, PublishedEvent};

/// A record pulled off a consumer, carrying its own ack handle so the
/// fan-out/await layers can ack only once they've durably forwarded it
/// (spec.md §4.5/§4.6: explicit ack, at-least-once delivery).
pub struct ConsumedEvent {
    pub event: PublishedEvent,
    acker: Box<dyn Acker>,
}

impl ConsumedEvent {
    pub fn new(event: PublishedEvent, acker: Box<dyn Acker>) -> Self {
        Self { event, acker }
    }

    pub async fn ack(self) -> Result<(), EventBusError> {
        self.acker.ack().await
    }
}

#[async_trait]
pub trait Acker: Send + Sync {
    async fn ack(&self) -> Result<(), EventBusError>;
}

/// A lazy sequence of messages on a subject filter; each must be `ack`'d by
/// the caller or it is redelivered. Ephemeral: dropping the consumer
/// releases server-side resources (spec.md §4.6 step 5).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EventConsumer: Send {
    async fn next(&mut self) -> Result<Option<ConsumedEvent>, EventBusError>;
}

/// Durable publication and filtered, explicitly-acked consumption over a
/// single named subject-addressed log (spec.md §4.5).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EventBus: Send + Sync {
    /// At-least-once: the caller (the Poller) has already reached the
    /// Store, so duplicate publishes are possible and consumers must be
    /// idempotent on `(signature, network)`.
    async fn publish(&self, event: PublishedEvent) -> Result<(), EventBusError>;

    async fn consume(
        &self,
        subject_filter: &str,
        deliver_policy: DeliverPolicy,
    ) -> Result<Box<dyn EventConsumer>, EventBusError>;
}
