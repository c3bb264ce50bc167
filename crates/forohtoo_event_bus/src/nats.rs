use async_nats::jetstream::consumer::pull;
use async_nats::jetstream::consumer::DeliverPolicy as NatsDeliverPolicy;
use async_nats::jetstream::stream::Config as StreamConfig;
use async_nats::jetstream::{self, Context};
use async_trait::async_trait;
use forohtoo_metrics::EventBusMetrics;
use futures_util::StreamExt;

use crate::bus::{Acker, ConsumedEvent, EventBus, EventConsumer};
use crate::error::EventBusError;
use crate::event::{DeliverPolicy, PublishedEvent};

/// Deployment-level constant per spec.md §6: one stream backs every subject
/// under `txns.*`.
pub const STREAM_NAME: &str = "FOROHTOO_TXNS";

pub struct NatsEventBus {
    jetstream: Context,
    metrics: EventBusMetrics,
}

impl NatsEventBus {
    pub async fn connect(url: &str) -> Result<Self, EventBusError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| EventBusError::Publish(format!("connect: {e}")))?;
        let jetstream = jetstream::new(client);
        jetstream
            .get_or_create_stream(StreamConfig {
                name: STREAM_NAME.to_string(),
                subjects: vec!["txns.*".to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| EventBusError::Publish(format!("ensure stream: {e}")))?;
        Ok(Self { jetstream, metrics: EventBusMetrics })
    }
}

#[async_trait]
impl EventBus for NatsEventBus {
    async fn publish(&self, event: PublishedEvent) -> Result<(), EventBusError> {
        let subject = event.subject();
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_publish(false);
                return Err(e.into());
            }
        };
        let result = async {
            let ack = self
                .jetstream
                .publish(subject, payload.into())
                .await
                .map_err(|e| EventBusError::Publish(e.to_string()))?;
            ack.await.map_err(|e| EventBusError::Publish(e.to_string()))?;
            Ok(())
        }
        .await;
        self.metrics.record_publish(result.is_ok());
        result
    }

    async fn consume(
        &self,
        subject_filter: &str,
        deliver_policy: DeliverPolicy,
    ) -> Result<Box<dyn EventConsumer>, EventBusError> {
        let stream = self
            .jetstream
            .get_stream(STREAM_NAME)
            .await
            .map_err(|e| EventBusError::Consumer(e.to_string()))?;
        let consumer = stream
            .create_consumer(pull::Config {
                filter_subject: subject_filter.to_string(),
                deliver_policy: match deliver_policy {
                    DeliverPolicy::New => NatsDeliverPolicy::New,
                    DeliverPolicy::All => NatsDeliverPolicy::All,
                },
                ack_policy: async_nats::jetstream::consumer::AckPolicy::Explicit,
                ..Default::default()
            })
            .await
            .map_err(|e| EventBusError::Consumer(e.to_string()))?;
        let messages =
            consumer.messages().await.map_err(|e| EventBusError::Consumer(e.to_string()))?;
        Ok(Box::new(NatsEventConsumer { messages: Box::pin(messages) }))
    }
}

type MessageStream = std::pin::Pin<
    Box<dyn futures::Stream<Item = Result<jetstream::Message, async_nats::jetstream::consumer::pull::MessagesError>> + Send>,
>;

struct NatsEventConsumer {
    messages: MessageStream,
}

struct NatsAcker {
    message: jetstream::Message,
}

#[async_trait]
impl Acker for NatsAcker {
    async fn ack(&self) -> Result<(), EventBusError> {
        self.message.ack().await.map_err(|e| EventBusError::Ack(e.to_string()))
    }
}

#[async_trait]
impl EventConsumer for NatsEventConsumer {
    async fn next(&mut self) -> Result<Option<ConsumedEvent>, EventBusError> {
        let Some(message) = self.messages.next().await else { return Ok(None) };
        let message = message.map_err(|e| EventBusError::Read(e.to_string()))?;
        let event: PublishedEvent = serde_json::from_slice(&message.payload)?;
        let acker = Box::new(NatsAcker { message: message.clone() });
        Ok(Some(ConsumedEvent::new(event, acker)))
    }
}
