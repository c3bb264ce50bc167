use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::Event;
use chrono::Utc;
use forohtoo_event_bus::{subject_for, DeliverPolicy, EventBus};
use forohtoo_metrics::SseMetrics;
use forohtoo_storage::Store;
use futures::Stream;
use serde_json::json;
use tracing::warn;

/// Historical replay is capped so a very wide `lookback` can't stall a
/// connection forever (spec.md §4.6 step 2); the most recent
/// `MAX_HISTORICAL` rows are kept, oldest-first.
const MAX_HISTORICAL: usize = 1000;

/// Implements the five-step SSE protocol of spec.md §4.6, minus the
/// keepalive comment: that is `axum::response::sse::KeepAlive`'s job, set by
/// the HTTP layer when it wraps this stream in `Sse::new(..).keep_alive(..)`.
pub fn transaction_events(
    store: Arc<dyn Store>,
    event_bus: Arc<dyn EventBus>,
    wallet_filter: Option<String>,
    lookback: Option<Duration>,
    metrics: SseMetrics,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        metrics.connection_opened();
        yield Ok(connected_event(wallet_filter.as_deref()));

        if let Some(lookback) = lookback {
            let now = Utc::now();
            let window_start = now - chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::zero());
            match store.list_transactions_by_time_range(window_start, now).await {
                Ok(mut historical) => {
                    if let Some(address) = &wallet_filter {
                        historical.retain(|t| &t.wallet_address == address);
                    }
                    if historical.len() > MAX_HISTORICAL {
                        let drop = historical.len() - MAX_HISTORICAL;
                        historical.drain(0..drop);
                    }
                    for transaction in historical {
                        yield Ok(transaction_event(&transaction));
                    }
                }
                Err(e) => {
                    warn!(error = %e, "historical backfill failed");
                    yield Ok(error_event(&e.to_string()));
                    metrics.connection_closed();
                    return;
                }
            }
        }

        let subject = match &wallet_filter {
            Some(address) => subject_for(address),
            None => "txns.*".to_string(),
        };
        let mut consumer = match event_bus.consume(&subject, DeliverPolicy::New).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to create live consumer");
                yield Ok(error_event(&e.to_string()));
                metrics.connection_closed();
                return;
            }
        };

        loop {
            match consumer.next().await {
                Ok(Some(consumed)) => {
                    let event = transaction_event(&consumed.event.transaction);
                    if let Err(e) = consumed.ack().await {
                        warn!(error = %e, "ack failed");
                        yield Ok(error_event(&e.to_string()));
                        break;
                    }
                    metrics.event_forwarded();
                    yield Ok(event);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "live consumption failed");
                    yield Ok(error_event(&e.to_string()));
                    break;
                }
            }
        }
        metrics.connection_closed();
    }
}

fn connected_event(wallet: Option<&str>) -> Event {
    Event::default().event("connected").json_data(json!({ "wallet": wallet })).unwrap_or_default()
}

fn transaction_event(transaction: &forohtoo_types::Transaction) -> Event {
    Event::default().event("transaction").json_data(transaction).unwrap_or_default()
}

fn error_event(message: &str) -> Event {
    Event::default().event("error").json_data(json!({ "error": message })).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use forohtoo_event_bus::{Acker, ConsumedEvent, EventBusError, MockEventBus, MockEventConsumer, PublishedEvent};
    use forohtoo_storage::MockStore;
    use forohtoo_types::{ConfirmationStatus, Network, Transaction};
    use futures::StreamExt;

    use super::*;

    struct NoopAcker;

    #[async_trait]
    impl Acker for NoopAcker {
        async fn ack(&self) -> Result<(), EventBusError> {
            Ok(())
        }
    }

    fn transaction(signature: &str) -> Transaction {
        Transaction {
            signature: signature.into(),
            network: Network::Devnet,
            wallet_address: "wallet".into(),
            from_address: None,
            slot: 1,
            block_time: Utc::now(),
            amount: 10,
            token_mint: None,
            memo: None,
            confirmation_status: ConfirmationStatus::Confirmed,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn emits_connected_then_historical_then_live_and_closes_on_end_of_stream() {
        let mut store = MockStore::new();
        let historical = transaction("sig-historical");
        let historical_clone = historical.clone();
        store
            .expect_list_transactions_by_time_range()
            .returning(move |_, _| Ok(vec![historical_clone.clone()]));

        let live = transaction("sig-live");
        let mut event_bus = MockEventBus::new();
        event_bus.expect_consume().returning(move |_, _| {
            let live = live.clone();
            let mut consumer = MockEventConsumer::new();
            let mut delivered = false;
            consumer.expect_next().returning(move || {
                if delivered {
                    return Ok(None);
                }
                delivered = true;
                Ok(Some(ConsumedEvent::new(
                    PublishedEvent { transaction: live.clone(), published_at: Utc::now() },
                    Box::new(NoopAcker),
                )))
            });
            Ok(Box::new(consumer) as Box<dyn forohtoo_event_bus::EventConsumer>)
        });

        let stream = transaction_events(
            Arc::new(store),
            Arc::new(event_bus),
            None,
            Some(Duration::from_secs(60)),
            SseMetrics,
        );
        let events: Vec<Event> = stream.map(|r| r.unwrap()).collect().await;
        // connected + historical + live = 3 events.
        assert_eq!(events.len(), 3);
    }
}
