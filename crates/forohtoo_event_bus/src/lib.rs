//! Event Bus Adapter (spec.md §4.5): durable, subject-addressed publication
//! of transaction events with explicit-ack consumption. Backed by NATS
//! JetStream.

mod bus;
mod error;
mod event;
mod nats;

pub use bus::{Acker, ConsumedEvent, EventBus, EventConsumer};
pub use error::EventBusError;
pub use event::{subject_for, DeliverPolicy, PublishedEvent};
pub use nats::{NatsEventBus, STREAM_NAME};

#[cfg(any(test, feature = "testing"))]
pub use bus::{MockEventBus, MockEventConsumer};
