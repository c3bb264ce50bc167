use std::sync::Arc;
use std::time::Duration;

use forohtoo_event_bus::{subject_for, DeliverPolicy, EventBus};
use forohtoo_storage::Store;
use forohtoo_types::{Network, Transaction};

use crate::error::{AwaitError, SseError};

/// A pure predicate over a decoded Transaction — common compositions per
/// spec.md §4.7 are "signature equals X", "amount + mint match", or a
/// [`crate::memo_filter::MemoFilterExpr`] over the memo.
pub type Predicate = Box<dyn Fn(&Transaction) -> bool + Send + Sync>;

/// The first historical-or-live transaction on `address`/`network` within
/// `lookback` that satisfies `predicate` (spec.md §4.7). Unlike
/// [`fanout::transaction_events`], this returns as soon as a match is found
/// rather than streaming indefinitely; it has no built-in timeout — the
/// caller wraps it in `tokio::time::timeout` (the HTTP/workflow layer's
/// responsibility, not this function's).
pub async fn await_transaction(
    store: Arc<dyn Store>,
    event_bus: Arc<dyn EventBus>,
    address: String,
    network: Network,
    lookback: Duration,
    predicate: Predicate,
) -> Result<Transaction, AwaitError> {
    let historical = store
        .list_transactions_by_wallet_and_time_range(
            &address,
            network,
            chrono::Utc::now() - chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::zero()),
            chrono::Utc::now(),
        )
        .await
        .map_err(SseError::from)?;
    for transaction in historical {
        if predicate(&transaction) {
            return Ok(transaction);
        }
    }

    let subject = subject_for(&address);
    let mut consumer = event_bus.consume(&subject, DeliverPolicy::New).await.map_err(SseError::from)?;
    loop {
        let consumed = consumer.next().await.map_err(SseError::from)?.ok_or(AwaitError::DeadlineExceeded)?;
        let matched = predicate(&consumed.event.transaction);
        let transaction = consumed.event.transaction.clone();
        consumed.ack().await.map_err(SseError::from)?;
        if matched {
            return Ok(transaction);
        }
    }
}
