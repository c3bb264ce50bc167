use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forohtoo_types::{Network, Registration, RegistrationKey, RegistrationStatus, Transaction};

use crate::error::StorageError;

#[derive(Clone, Debug, Default)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatus>,
    pub network: Option<Network>,
}

#[derive(Debug)]
pub struct CreateTransactionParams {
    pub signature: String,
    pub network: Network,
    pub wallet_address: String,
    pub from_address: Option<String>,
    pub slot: u64,
    pub block_time: DateTime<Utc>,
    pub amount: i64,
    pub token_mint: Option<String>,
    pub memo: Option<String>,
    pub confirmation_status: forohtoo_types::ConfirmationStatus,
}

/// Outcome of `create_transaction`: a plain `Result` can't distinguish a
/// duplicate signature (expected under at-least-once publication, §4.3) from
/// a genuine backend failure, so the happy path is itself an enum.
#[derive(Debug)]
pub enum CreateTransactionOutcome {
    Created(Transaction),
    AlreadyExists,
}

/// The durable state every other component reads through. Row-granular
/// transactionality only (spec.md §4.1): callers never compose multi-row
/// transactions against this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn upsert_registration(
        &self,
        key: &RegistrationKey,
        poll_interval_secs: u64,
        status: RegistrationStatus,
    ) -> Result<Registration, StorageError>;

    async fn get_registration(&self, key: &RegistrationKey) -> Result<Option<Registration>, StorageError>;

    async fn registration_exists(&self, key: &RegistrationKey) -> Result<bool, StorageError>;

    async fn list_registrations(
        &self,
        filter: RegistrationFilter,
    ) -> Result<Vec<Registration>, StorageError>;

    async fn list_registrations_by_address(
        &self,
        address: &str,
        network: Network,
    ) -> Result<Vec<Registration>, StorageError>;

    /// Idempotent: deleting an absent registration is not an error.
    async fn delete_registration(&self, key: &RegistrationKey) -> Result<(), StorageError>;

    async fn update_last_poll_time(
        &self,
        key: &RegistrationKey,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn update_status(
        &self,
        key: &RegistrationKey,
        status: RegistrationStatus,
    ) -> Result<(), StorageError>;

    async fn create_transaction(
        &self,
        params: CreateTransactionParams,
    ) -> Result<CreateTransactionOutcome, StorageError>;

    /// Range scan ordered by `block_time DESC`, per spec.md §4.1.
    async fn get_transaction_signatures(
        &self,
        wallet_address: &str,
        network: Network,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<String>, StorageError>;

    async fn list_transactions_by_wallet(
        &self,
        wallet_address: &str,
        network: Network,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, StorageError>;

    async fn list_transactions_by_wallet_and_time_range(
        &self,
        wallet_address: &str,
        network: Network,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StorageError>;

    async fn list_transactions_by_time_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StorageError>;

    async fn get_latest_transaction_by_wallet(
        &self,
        wallet_address: &str,
        network: Network,
    ) -> Result<Option<Transaction>, StorageError>;

    async fn get_transactions_since(
        &self,
        wallet_address: &str,
        network: Network,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StorageError>;

    async fn count_transactions_by_wallet(
        &self,
        wallet_address: &str,
        network: Network,
    ) -> Result<i64, StorageError>;

    async fn delete_transactions_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError>;

    async fn health_check(&self) -> Result<(), StorageError>;
}
