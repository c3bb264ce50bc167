use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forohtoo_types::{
    AssetType, ConfirmationStatus, Network, Registration, RegistrationKey, RegistrationStatus,
    Transaction,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::error::StorageError;
use crate::store::{
    CreateTransactionOutcome, CreateTransactionParams, RegistrationFilter, Store,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct RegistrationRow {
    address: String,
    network: String,
    asset_type: String,
    token_mint: String,
    poll_interval_secs: i64,
    associated_token_address: Option<String>,
    last_poll_time: Option<DateTime<Utc>>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RegistrationRow {
    fn into_domain(self) -> Registration {
        let token_mint = if self.token_mint.is_empty() { None } else { Some(self.token_mint) };
        let key = RegistrationKey {
            address: self.address,
            network: Network::from_str(&self.network).expect("network stored by this crate is always valid"),
            asset_type: AssetType::from_str(&self.asset_type)
                .expect("asset_type stored by this crate is always valid"),
            token_mint,
        };
        Registration {
            key,
            poll_interval: std::time::Duration::from_secs(self.poll_interval_secs as u64),
            associated_token_address: self.associated_token_address,
            last_poll_time: self.last_poll_time,
            status: parse_status(&self.status),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct TransactionRow {
    signature: String,
    network: String,
    wallet_address: String,
    from_address: Option<String>,
    slot: i64,
    block_time: DateTime<Utc>,
    amount: i64,
    token_mint: Option<String>,
    memo: Option<String>,
    confirmation_status: String,
    created_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> Transaction {
        Transaction {
            signature: self.signature,
            network: Network::from_str(&self.network).expect("network stored by this crate is always valid"),
            wallet_address: self.wallet_address,
            from_address: self.from_address,
            slot: self.slot as u64,
            block_time: self.block_time,
            amount: self.amount,
            token_mint: self.token_mint,
            memo: self.memo,
            confirmation_status: parse_confirmation_status(&self.confirmation_status),
            created_at: self.created_at,
        }
    }
}

fn status_str(status: RegistrationStatus) -> &'static str {
    match status {
        RegistrationStatus::Active => "active",
        RegistrationStatus::Paused => "paused",
        RegistrationStatus::Error => "error",
    }
}

fn parse_status(s: &str) -> RegistrationStatus {
    match s {
        "active" => RegistrationStatus::Active,
        "paused" => RegistrationStatus::Paused,
        _ => RegistrationStatus::Error,
    }
}

fn confirmation_status_str(status: ConfirmationStatus) -> &'static str {
    match status {
        ConfirmationStatus::Processed => "processed",
        ConfirmationStatus::Confirmed => "confirmed",
        ConfirmationStatus::Finalized => "finalized",
    }
}

fn parse_confirmation_status(s: &str) -> ConfirmationStatus {
    match s {
        "finalized" => ConfirmationStatus::Finalized,
        "confirmed" => ConfirmationStatus::Confirmed,
        _ => ConfirmationStatus::Processed,
    }
}

fn mint_column(key: &RegistrationKey) -> &str {
    key.token_mint.as_deref().unwrap_or("")
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_registration(
        &self,
        key: &RegistrationKey,
        poll_interval_secs: u64,
        status: RegistrationStatus,
    ) -> Result<Registration, StorageError> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            INSERT INTO registrations
                (address, network, asset_type, token_mint, poll_interval_secs,
                 associated_token_address, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
            ON CONFLICT (address, network, asset_type, token_mint)
            DO UPDATE SET poll_interval_secs = $5, status = $7, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(&key.address)
        .bind(key.network.to_string())
        .bind(key.asset_type.to_string())
        .bind(mint_column(key))
        .bind(poll_interval_secs as i64)
        .bind(key.associated_token_address())
        .bind(status_str(status))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into_domain())
    }

    async fn get_registration(&self, key: &RegistrationKey) -> Result<Option<Registration>, StorageError> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            "SELECT * FROM registrations WHERE address = $1 AND network = $2 AND asset_type = $3 AND token_mint = $4",
        )
        .bind(&key.address)
        .bind(key.network.to_string())
        .bind(key.asset_type.to_string())
        .bind(mint_column(key))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(RegistrationRow::into_domain))
    }

    async fn registration_exists(&self, key: &RegistrationKey) -> Result<bool, StorageError> {
        Ok(self.get_registration(key).await?.is_some())
    }

    async fn list_registrations(
        &self,
        filter: RegistrationFilter,
    ) -> Result<Vec<Registration>, StorageError> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT * FROM registrations
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR network = $2)
            ORDER BY address
            "#,
        )
        .bind(filter.status.map(status_str))
        .bind(filter.network.map(|n| n.to_string()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RegistrationRow::into_domain).collect())
    }

    async fn list_registrations_by_address(
        &self,
        address: &str,
        network: Network,
    ) -> Result<Vec<Registration>, StorageError> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            "SELECT * FROM registrations WHERE address = $1 AND network = $2 ORDER BY asset_type, token_mint",
        )
        .bind(address)
        .bind(network.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RegistrationRow::into_domain).collect())
    }

    async fn delete_registration(&self, key: &RegistrationKey) -> Result<(), StorageError> {
        sqlx::query(
            "DELETE FROM registrations WHERE address = $1 AND network = $2 AND asset_type = $3 AND token_mint = $4",
        )
        .bind(&key.address)
        .bind(key.network.to_string())
        .bind(key.asset_type.to_string())
        .bind(mint_column(key))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_last_poll_time(
        &self,
        key: &RegistrationKey,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE registrations SET last_poll_time = $5, updated_at = now() WHERE address = $1 AND network = $2 AND asset_type = $3 AND token_mint = $4",
        )
        .bind(&key.address)
        .bind(key.network.to_string())
        .bind(key.asset_type.to_string())
        .bind(mint_column(key))
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_status(
        &self,
        key: &RegistrationKey,
        status: RegistrationStatus,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE registrations SET status = $5, updated_at = now() WHERE address = $1 AND network = $2 AND asset_type = $3 AND token_mint = $4",
        )
        .bind(&key.address)
        .bind(key.network.to_string())
        .bind(key.asset_type.to_string())
        .bind(mint_column(key))
        .bind(status_str(status))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_transaction(
        &self,
        params: CreateTransactionParams,
    ) -> Result<CreateTransactionOutcome, StorageError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions
                (signature, network, wallet_address, from_address, slot, block_time,
                 amount, token_mint, memo, confirmation_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            ON CONFLICT (signature, network) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&params.signature)
        .bind(params.network.to_string())
        .bind(&params.wallet_address)
        .bind(&params.from_address)
        .bind(params.slot as i64)
        .bind(params.block_time)
        .bind(params.amount)
        .bind(&params.token_mint)
        .bind(&params.memo)
        .bind(confirmation_status_str(params.confirmation_status))
        .fetch_optional(&self.pool)
        .await?;
        Ok(match row {
            Some(row) => CreateTransactionOutcome::Created(row.into_domain()),
            None => CreateTransactionOutcome::AlreadyExists,
        })
    }

    async fn get_transaction_signatures(
        &self,
        wallet_address: &str,
        network: Network,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT signature FROM transactions
            WHERE wallet_address = $1 AND network = $2
              AND ($3::timestamptz IS NULL OR block_time >= $3)
            ORDER BY block_time DESC
            LIMIT $4
            "#,
        )
        .bind(wallet_address)
        .bind(network.to_string())
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(sig,)| sig).collect())
    }

    async fn list_transactions_by_wallet(
        &self,
        wallet_address: &str,
        network: Network,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, StorageError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE wallet_address = $1 AND network = $2
            ORDER BY block_time DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(wallet_address)
        .bind(network.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TransactionRow::into_domain).collect())
    }

    async fn list_transactions_by_wallet_and_time_range(
        &self,
        wallet_address: &str,
        network: Network,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StorageError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE wallet_address = $1 AND network = $2 AND block_time BETWEEN $3 AND $4
            ORDER BY block_time ASC
            "#,
        )
        .bind(wallet_address)
        .bind(network.to_string())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TransactionRow::into_domain).collect())
    }

    async fn list_transactions_by_time_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StorageError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE block_time BETWEEN $1 AND $2 ORDER BY block_time ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TransactionRow::into_domain).collect())
    }

    async fn get_latest_transaction_by_wallet(
        &self,
        wallet_address: &str,
        network: Network,
    ) -> Result<Option<Transaction>, StorageError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE wallet_address = $1 AND network = $2 ORDER BY block_time DESC LIMIT 1",
        )
        .bind(wallet_address)
        .bind(network.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TransactionRow::into_domain))
    }

    async fn get_transactions_since(
        &self,
        wallet_address: &str,
        network: Network,
        since: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StorageError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE wallet_address = $1 AND network = $2 AND block_time >= $3 ORDER BY block_time ASC",
        )
        .bind(wallet_address)
        .bind(network.to_string())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TransactionRow::into_domain).collect())
    }

    async fn count_transactions_by_wallet(
        &self,
        wallet_address: &str,
        network: Network,
    ) -> Result<i64, StorageError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM transactions WHERE wallet_address = $1 AND network = $2",
        )
        .bind(wallet_address)
        .bind(network.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn delete_transactions_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM transactions WHERE block_time < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
