use chrono::{DateTime, Utc};
use forohtoo_types::Transaction;
use serde::{Deserialize, Serialize};

/// The record shape actually written to the stream: a Transaction plus the
/// timestamp the adapter published it, per spec.md §4.5.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub published_at: DateTime<Utc>,
}

impl PublishedEvent {
    pub fn subject(&self) -> String {
        subject_for(&self.transaction.wallet_address)
    }
}

pub fn subject_for(wallet_address: &str) -> String {
    format!("txns.{wallet_address}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliverPolicy {
    New,
    All,
}
