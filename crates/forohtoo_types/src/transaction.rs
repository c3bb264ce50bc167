use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::Network;

/// Mirrors the oracle's own commitment levels; ordered so a Poller can tell
/// whether a re-observed signature represents forward progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Processed,
    Confirmed,
    Finalized,
}

impl ConfirmationStatus {
    /// Whether a write carrying `next` is allowed on a row already at `self`.
    /// Status only ever moves forward; a row already `confirmed` cannot
    /// regress to `processed`.
    pub fn can_promote_to(self, next: ConfirmationStatus) -> bool {
        next >= self
    }
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfirmationStatus::Processed => "processed",
            ConfirmationStatus::Confirmed => "confirmed",
            ConfirmationStatus::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionKey {
    pub signature: String,
    pub network: Network,
}

/// A detected effect on a monitored wallet, as persisted and as published on
/// the event bus. `amount` is signed and opaque (base units; no decimal
/// normalization is attempted here per spec.md's non-goal on financial
/// accounting).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub signature: String,
    pub network: Network,
    pub wallet_address: String,
    pub from_address: Option<String>,
    pub slot: u64,
    pub block_time: DateTime<Utc>,
    pub amount: i64,
    pub token_mint: Option<String>,
    pub memo: Option<String>,
    pub confirmation_status: ConfirmationStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn key(&self) -> TransactionKey {
        TransactionKey { signature: self.signature.clone(), network: self.network }
    }

    pub fn is_native(&self) -> bool {
        self.token_mint.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_status_orders_by_durability() {
        assert!(ConfirmationStatus::Processed < ConfirmationStatus::Confirmed);
        assert!(ConfirmationStatus::Confirmed < ConfirmationStatus::Finalized);
    }

    #[test]
    fn promotion_is_monotone() {
        assert!(ConfirmationStatus::Confirmed.can_promote_to(ConfirmationStatus::Finalized));
        assert!(!ConfirmationStatus::Confirmed.can_promote_to(ConfirmationStatus::Processed));
        assert!(ConfirmationStatus::Confirmed.can_promote_to(ConfirmationStatus::Confirmed));
    }
}
