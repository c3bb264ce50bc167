use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forohtoo_types::{ConfirmationStatus, Network};

use crate::error::OracleError;

#[derive(Clone, Debug, PartialEq)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    pub block_time: DateTime<Utc>,
    pub confirmation_status: ConfirmationStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionEffect {
    pub from_address: Option<String>,
    pub slot: u64,
    pub block_time: DateTime<Utc>,
    pub amount: i64,
    pub token_mint: Option<String>,
    pub memo: Option<String>,
    pub confirmation_status: ConfirmationStatus,
}

/// The blockchain RPC client, reduced to the shape the Poller needs
/// (spec.md §4.2). No ordering across addresses is assumed; a caller
/// requesting a non-existent signature simply gets `Ok(None)`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RpcOracle: Send + Sync {
    async fn recent_signatures(
        &self,
        address: &str,
        network: Network,
        limit: u32,
        before: Option<String>,
    ) -> Result<Vec<SignatureInfo>, OracleError>;

    async fn get_transaction(
        &self,
        signature: &str,
        network: Network,
        wallet_address: &str,
    ) -> Result<Option<TransactionEffect>, OracleError>;

    async fn derive_token_account(&self, owner: &str, mint: &str) -> Result<String, OracleError>;
}
