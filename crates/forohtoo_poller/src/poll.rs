use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use forohtoo_event_bus::{EventBus, PublishedEvent};
use forohtoo_metrics::PollerMetrics;
use forohtoo_rpc_oracle::{OracleError, RpcOracle, SignatureInfo, TransactionEffect};
use forohtoo_storage::{CreateTransactionOutcome, CreateTransactionParams, Store};
use forohtoo_types::{RegistrationKey, RegistrationStatus};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, info, instrument, warn};

use crate::error::PollerError;

pub const DEFAULT_SIGNATURE_LIMIT: u32 = 25;
pub const MAX_SIGNATURE_LIMIT: u32 = 1000;

/// The window subtracted from `last_poll_time` before asking the Store for
/// already-known signatures, so a signature landing exactly at the boundary
/// of the previous cycle is never missed (spec.md §4.3 step 4).
const LOOKBACK_EPSILON: chrono::Duration = chrono::Duration::seconds(1);

const RETRY_ATTEMPTS: usize = 5;
const RETRY_BASE_DELAY_MS: u64 = 100;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PollCycleOutcome {
    pub transactions_detected: usize,
    pub skipped_inactive: bool,
}

/// One invocation operates on one Registration (spec.md §4.3). Generic over
/// its three collaborators so tests can substitute mocks, mirroring the
/// teacher's `GenericStateSync<TCentralSource, ...>` shape.
pub struct PollerActivity<S, O, E> {
    store: Arc<S>,
    oracle: Arc<O>,
    event_bus: Arc<E>,
    metrics: PollerMetrics,
    signature_limit: u32,
}

impl<S, O, E> PollerActivity<S, O, E>
where
    S: Store,
    O: RpcOracle,
    E: EventBus,
{
    pub fn new(store: Arc<S>, oracle: Arc<O>, event_bus: Arc<E>) -> Self {
        Self {
            store,
            oracle,
            event_bus,
            metrics: PollerMetrics,
            signature_limit: DEFAULT_SIGNATURE_LIMIT,
        }
    }

    pub fn with_signature_limit(mut self, limit: u32) -> Self {
        self.signature_limit = limit.min(MAX_SIGNATURE_LIMIT);
        self
    }

    #[instrument(skip(self), fields(address = %key.address, network = %key.network))]
    pub async fn run_poll_cycle(&self, key: &RegistrationKey) -> Result<PollCycleOutcome, PollerError> {
        self.metrics.record_cycle_started();
        let start = std::time::Instant::now();
        let result = self.run_poll_cycle_inner(key).await;
        let duration = start.elapsed().as_secs_f64();
        match &result {
            Ok(outcome) => {
                self.metrics.record_cycle_outcome(true, duration, outcome.transactions_detected as u64)
            }
            Err(_) => self.metrics.record_cycle_outcome(false, duration, 0),
        }
        result
    }

    async fn run_poll_cycle_inner(&self, key: &RegistrationKey) -> Result<PollCycleOutcome, PollerError> {
        let registration = self.store.get_registration(key).await?.ok_or(PollerError::RegistrationNotFound)?;
        if registration.status != RegistrationStatus::Active {
            debug!(status = ?registration.status, "registration inactive, skipping cycle");
            return Ok(PollCycleOutcome { skipped_inactive: true, ..Default::default() });
        }

        let cycle_start = Utc::now();
        let poll_address = key.poll_address();

        let signatures = self.fetch_recent_signatures(&poll_address, key.network).await?;

        let since = registration.last_poll_time.map(|t| t - LOOKBACK_EPSILON);
        let known: std::collections::HashSet<String> = self
            .store
            .get_transaction_signatures(&key.address, key.network, since, self.signature_limit as i64)
            .await?
            .into_iter()
            .collect();

        let new_signatures: Vec<&SignatureInfo> =
            signatures.iter().filter(|s| !known.contains(&s.signature)).collect();

        let mut detected = 0usize;
        for sig in new_signatures.into_iter().rev() {
            let Some(effect) =
                self.fetch_transaction(&sig.signature, key.network, &key.address).await?
            else {
                warn!(signature = %sig.signature, "oracle reported signature with no fetchable transaction");
                continue;
            };
            if effect.amount == 0 {
                continue;
            }

            let outcome = self
                .store
                .create_transaction(CreateTransactionParams {
                    signature: sig.signature.clone(),
                    network: key.network,
                    wallet_address: key.address.clone(),
                    from_address: effect.from_address.clone(),
                    slot: effect.slot,
                    block_time: effect.block_time,
                    amount: effect.amount,
                    token_mint: effect.token_mint.clone(),
                    memo: effect.memo.clone(),
                    confirmation_status: effect.confirmation_status,
                })
                .await?;

            let CreateTransactionOutcome::Created(transaction) = outcome else {
                debug!(signature = %sig.signature, "transaction already recorded, skipping publish");
                continue;
            };

            self.event_bus
                .publish(PublishedEvent { transaction, published_at: Utc::now() })
                .await?;
            detected += 1;
        }

        self.store.update_last_poll_time(key, cycle_start).await?;
        info!(detected, "poll cycle complete");
        Ok(PollCycleOutcome { transactions_detected: detected, skipped_inactive: false })
    }

    async fn fetch_recent_signatures(
        &self,
        address: &str,
        network: forohtoo_types::Network,
    ) -> Result<Vec<SignatureInfo>, PollerError> {
        let oracle = &self.oracle;
        let result = RetryIf::spawn(
            retry_strategy(),
            || oracle.recent_signatures(address, network, self.signature_limit, None),
            is_recoverable_oracle_error,
        )
        .await;
        Ok(result?)
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
        network: forohtoo_types::Network,
        wallet_address: &str,
    ) -> Result<Option<TransactionEffect>, PollerError> {
        let oracle = &self.oracle;
        let result = RetryIf::spawn(
            retry_strategy(),
            || oracle.get_transaction(signature, network, wallet_address),
            is_recoverable_oracle_error,
        )
        .await;
        Ok(result?)
    }
}

fn retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(RETRY_BASE_DELAY_MS)
        .max_delay(RETRY_MAX_DELAY)
        .map(jitter)
        .take(RETRY_ATTEMPTS)
}

fn is_recoverable_oracle_error(error: &OracleError) -> bool {
    error.is_recoverable()
}
