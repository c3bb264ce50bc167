use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use forohtoo_event_bus::EventBus;
use forohtoo_metrics::PaymentWorkflowMetrics;
use forohtoo_schedule::ScheduleRuntime;
use forohtoo_storage::{Store, WorkflowStore};
use forohtoo_types::{
    payment_workflow_id, Invoice, InvoiceParams, Network, PaymentWorkflow, PaymentWorkflowStatus,
    RegistrationKey, RegistrationStatus,
};
use tracing::{error, info, warn};

use crate::error::WorkflowError;

#[derive(Clone, Debug)]
pub struct PaymentWorkflowInput {
    pub target: RegistrationKey,
    pub poll_interval: Duration,
    pub service_wallet: String,
    pub service_network: Network,
    pub usdc_mint: String,
    pub fee_amount: u64,
    pub payment_timeout: Duration,
    pub memo_prefix: String,
    pub status_url_base: String,
}

/// Stands in for the external workflow runtime spec.md §4.8 treats as out of
/// scope: "start a workflow with id X, query its current result, wait for
/// completion". `InProcessWorkflowRuntime` is the only implementation; a
/// durable runtime would satisfy the same trait without the HTTP layer
/// noticing.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WorkflowRuntime: Send + Sync {
    async fn start_payment_workflow(
        &self,
        input: PaymentWorkflowInput,
    ) -> Result<PaymentWorkflow, WorkflowError>;

    async fn get_payment_workflow(
        &self,
        workflow_id: &str,
    ) -> Result<Option<PaymentWorkflow>, WorkflowError>;
}

/// Drives each Payment Workflow as a `tokio::task`; state transitions are
/// persisted to the same Postgres database the Store uses
/// (`payment_workflows`), so a query survives a process restart even though
/// the in-flight `Await` does not — a restarted process simply never
/// resolves the stale `Pending` row, which is acceptable because a fresh
/// `POST` creates a new workflow.
pub struct InProcessWorkflowRuntime {
    store: Arc<dyn Store>,
    workflow_store: Arc<dyn WorkflowStore>,
    event_bus: Arc<dyn EventBus>,
    schedule_runtime: Arc<dyn ScheduleRuntime>,
    metrics: PaymentWorkflowMetrics,
    in_flight: Arc<DashMap<String, ()>>,
}

impl InProcessWorkflowRuntime {
    pub fn new(
        store: Arc<dyn Store>,
        workflow_store: Arc<dyn WorkflowStore>,
        event_bus: Arc<dyn EventBus>,
        schedule_runtime: Arc<dyn ScheduleRuntime>,
    ) -> Self {
        Self {
            store,
            workflow_store,
            event_bus,
            schedule_runtime,
            metrics: PaymentWorkflowMetrics,
            in_flight: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl WorkflowRuntime for InProcessWorkflowRuntime {
    async fn start_payment_workflow(
        &self,
        input: PaymentWorkflowInput,
    ) -> Result<PaymentWorkflow, WorkflowError> {
        let workflow_id = payment_workflow_id(&input.target.address);
        let memo = format!("{}{}", input.memo_prefix, input.target.address);
        let new_invoice = || {
            Invoice::new(
                InvoiceParams {
                    id: input.target.address.clone(),
                    pay_to_address: input.service_wallet.clone(),
                    network: input.service_network,
                    usdc_mint: input.usdc_mint.clone(),
                    amount: input.fee_amount,
                    memo: memo.clone(),
                    timeout_secs: input.payment_timeout.as_secs(),
                    created_at: chrono::Utc::now(),
                },
                format!("{}/{}", input.status_url_base, workflow_id),
                String::new(),
            )
        };

        let existing = self.workflow_store.get_payment_workflow(&workflow_id).await?;
        let record = match existing {
            // Completed/Failed are true terminal states: the workflow ran to
            // its conclusion and nothing about a repeat POST should disturb
            // that record.
            Some(record)
                if matches!(
                    record.status,
                    PaymentWorkflowStatus::Completed | PaymentWorkflowStatus::Failed
                ) =>
            {
                return Ok(record);
            }
            // Still genuinely in flight: hand back the same record rather
            // than generating a second invoice for the same address
            // (spec.md §4.8's idempotency requirement).
            Some(record)
                if record.status == PaymentWorkflowStatus::Pending
                    && !record.invoice.has_expired(chrono::Utc::now()) =>
            {
                return Ok(record);
            }
            // Expired, or a Pending row whose invoice lapsed without the
            // background Await durably recording it (a process restarted
            // mid-wait) — re-arm with a fresh invoice so the caller gets a
            // usable one instead of the frozen stale record.
            Some(record) => {
                self.workflow_store
                    .reset_payment_workflow(
                        &record.workflow_id,
                        input.poll_interval.as_secs(),
                        new_invoice(),
                    )
                    .await?
            }
            None => {
                self.workflow_store
                    .create_payment_workflow(
                        workflow_id.clone(),
                        input.target.clone(),
                        input.poll_interval.as_secs(),
                        new_invoice(),
                    )
                    .await?
            }
        };

        // Only spawn the background Await once per id, for this process's
        // lifetime.
        if self.in_flight.insert(workflow_id.clone(), ()).is_some() {
            return Ok(record);
        }

        self.metrics.record_started();
        let store = self.store.clone();
        let event_bus = self.event_bus.clone();
        let workflow_store = self.workflow_store.clone();
        let schedule_runtime = self.schedule_runtime.clone();
        let metrics = self.metrics;
        let in_flight = self.in_flight.clone();
        let target = input.target.clone();
        let poll_interval = input.poll_interval;
        let expected_mint = input.usdc_mint.clone();
        let expected_amount = input.fee_amount as i64;
        let expected_memo = memo;
        let payment_timeout = input.payment_timeout;
        let id_for_task = workflow_id.clone();

        tokio::spawn(async move {
            let predicate: forohtoo_sse::Predicate = Box::new(move |t| {
                t.token_mint.as_deref() == Some(expected_mint.as_str())
                    && t.amount == expected_amount
                    && t.memo.as_deref() == Some(expected_memo.as_str())
            });

            let outcome = tokio::time::timeout(
                payment_timeout,
                forohtoo_sse::await_transaction(
                    store.clone(),
                    event_bus,
                    input.service_wallet.clone(),
                    input.service_network,
                    payment_timeout,
                    predicate,
                ),
            )
            .await;

            match outcome {
                Ok(Ok(transaction)) => {
                    if let Err(e) = workflow_store
                        .complete_payment_workflow(&id_for_task, transaction.signature.clone())
                        .await
                    {
                        error!(workflow_id = %id_for_task, error = %e, "failed to record workflow completion");
                    }
                    if let Err(e) = store
                        .upsert_registration(&target, poll_interval.as_secs(), RegistrationStatus::Active)
                        .await
                    {
                        error!(workflow_id = %id_for_task, error = %e, "failed to activate registration after payment");
                    } else if let Err(e) =
                        forohtoo_schedule::upsert(schedule_runtime.as_ref(), target.clone(), poll_interval).await
                    {
                        error!(workflow_id = %id_for_task, error = %e, "failed to create schedule after payment");
                    }
                    metrics.record_completed();
                    info!(workflow_id = %id_for_task, signature = %transaction.signature, "payment workflow completed");
                }
                Ok(Err(e)) => {
                    warn!(workflow_id = %id_for_task, error = %e, "payment workflow failed");
                    if let Err(e) =
                        workflow_store.fail_payment_workflow(&id_for_task, e.to_string()).await
                    {
                        error!(workflow_id = %id_for_task, error = %e, "failed to record workflow failure");
                    }
                    metrics.record_failed();
                }
                Err(_elapsed) => {
                    warn!(workflow_id = %id_for_task, "payment workflow expired waiting for payment");
                    if let Err(e) = workflow_store.expire_payment_workflow(&id_for_task).await {
                        error!(workflow_id = %id_for_task, error = %e, "failed to record workflow expiry");
                    }
                    metrics.record_expired();
                }
            }
            in_flight.remove(&id_for_task);
        });

        Ok(record)
    }

    async fn get_payment_workflow(
        &self,
        workflow_id: &str,
    ) -> Result<Option<PaymentWorkflow>, WorkflowError> {
        Ok(self.workflow_store.get_payment_workflow(workflow_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use forohtoo_event_bus::{
        Acker, ConsumedEvent, EventBusError, MockEventBus, MockEventConsumer, PublishedEvent,
    };
    use forohtoo_schedule::MockScheduleRuntime;
    use forohtoo_storage::{MockStore, MockWorkflowStore};
    use forohtoo_types::{AssetType, ConfirmationStatus, PaymentWorkflowStatus, Transaction};
    use tokio::time::sleep;

    use super::*;

    struct NoopAcker;

    #[async_trait]
    impl Acker for NoopAcker {
        async fn ack(&self) -> Result<(), EventBusError> {
            Ok(())
        }
    }

    /// A consumer whose `next` never resolves, so the workflow's
    /// `tokio::time::timeout` is what ends the wait, not end-of-stream.
    struct HangingConsumer;

    #[async_trait]
    impl forohtoo_event_bus::EventConsumer for HangingConsumer {
        async fn next(&mut self) -> Result<Option<ConsumedEvent>, EventBusError> {
            std::future::pending().await
        }
    }

    fn target() -> RegistrationKey {
        RegistrationKey {
            address: bs58::encode([7u8; 32]).into_string(),
            network: Network::Devnet,
            asset_type: AssetType::Native,
            token_mint: None,
        }
    }

    fn pending_record(target: &RegistrationKey, invoice: &Invoice) -> PaymentWorkflow {
        PaymentWorkflow {
            workflow_id: payment_workflow_id(&target.address),
            target: target.clone(),
            poll_interval_secs: 30,
            invoice: invoice.clone(),
            status: PaymentWorkflowStatus::Pending,
            payment_signature: None,
            error_message: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn input(target: RegistrationKey) -> PaymentWorkflowInput {
        PaymentWorkflowInput {
            target,
            poll_interval: Duration::from_secs(30),
            service_wallet: bs58::encode([9u8; 32]).into_string(),
            service_network: Network::Devnet,
            usdc_mint: bs58::encode([2u8; 32]).into_string(),
            fee_amount: 1_000_000,
            payment_timeout: Duration::from_millis(50),
            memo_prefix: "forohtoo:".into(),
            status_url_base: "https://example.test/status".into(),
        }
    }

    fn test_invoice(wf_input: &PaymentWorkflowInput) -> Invoice {
        Invoice::new(
            InvoiceParams {
                id: wf_input.target.address.clone(),
                pay_to_address: wf_input.service_wallet.clone(),
                network: wf_input.service_network,
                usdc_mint: wf_input.usdc_mint.clone(),
                amount: wf_input.fee_amount,
                memo: format!("{}{}", wf_input.memo_prefix, wf_input.target.address),
                timeout_secs: wf_input.payment_timeout.as_secs(),
                created_at: chrono::Utc::now(),
            },
            format!("{}/{}", wf_input.status_url_base, payment_workflow_id(&wf_input.target.address)),
            String::new(),
        )
    }

    fn transaction(signature: &str, mint: &str, memo: &str, amount: i64) -> Transaction {
        Transaction {
            signature: signature.into(),
            network: Network::Devnet,
            wallet_address: bs58::encode([9u8; 32]).into_string(),
            from_address: None,
            slot: 1,
            block_time: chrono::Utc::now(),
            amount,
            token_mint: Some(mint.into()),
            memo: Some(memo.into()),
            confirmation_status: ConfirmationStatus::Confirmed,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn idempotent_restart_returns_terminal_record_without_spawning() {
        let target = target();
        let wf_input = input(target.clone());
        let invoice = test_invoice(&wf_input);

        let mut workflow_store = MockWorkflowStore::new();
        workflow_store.expect_get_payment_workflow().returning(move |id| {
            let mut record = pending_record(&target, &invoice);
            record.workflow_id = id.to_string();
            record.status = PaymentWorkflowStatus::Completed;
            Ok(Some(record))
        });

        let runtime = InProcessWorkflowRuntime::new(
            Arc::new(MockStore::new()),
            Arc::new(workflow_store),
            Arc::new(MockEventBus::new()),
            Arc::new(MockScheduleRuntime::new()),
        );

        let result = runtime.start_payment_workflow(wf_input).await.unwrap();
        assert_eq!(result.status, PaymentWorkflowStatus::Completed);
    }

    #[tokio::test]
    async fn expired_workflow_is_reset_with_a_fresh_invoice_and_retried() {
        let target = target();
        let wf_input = input(target.clone());
        let stale_invoice = test_invoice(&wf_input);
        let reset_target = target.clone();

        let mut store = MockStore::new();
        store
            .expect_list_transactions_by_wallet_and_time_range()
            .returning(|_, _, _, _| Ok(vec![]));

        let mut event_bus = MockEventBus::new();
        event_bus.expect_consume().returning(|_, _| {
            let mut consumer = MockEventConsumer::new();
            consumer.expect_next().returning(|| Ok(None));
            Ok(Box::new(consumer) as Box<dyn forohtoo_event_bus::EventConsumer>)
        });

        let mut workflow_store = MockWorkflowStore::new();
        workflow_store.expect_get_payment_workflow().returning(move |id| {
            let mut record = pending_record(&target, &stale_invoice);
            record.workflow_id = id.to_string();
            record.status = PaymentWorkflowStatus::Expired;
            Ok(Some(record))
        });
        workflow_store.expect_reset_payment_workflow().returning(move |id, _, invoice| {
            let mut record = pending_record(&reset_target, &invoice);
            record.workflow_id = id.to_string();
            Ok(record)
        });
        workflow_store.expect_fail_payment_workflow().returning(|_, _| Ok(()));

        let runtime = InProcessWorkflowRuntime::new(
            Arc::new(store),
            Arc::new(workflow_store),
            Arc::new(event_bus),
            Arc::new(MockScheduleRuntime::new()),
        );

        let record = runtime.start_payment_workflow(wf_input).await.unwrap();
        assert_eq!(record.status, PaymentWorkflowStatus::Pending);

        // The retried run happens on a spawned task; give it a moment to run.
        sleep(StdDuration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn matching_payment_completes_the_workflow_and_activates_registration() {
        let target = target();
        let wf_input = input(target.clone());
        let matching = transaction(
            "sig-paid",
            &wf_input.usdc_mint,
            &format!("{}{}", wf_input.memo_prefix, target.address),
            wf_input.fee_amount as i64,
        );

        let mut store = MockStore::new();
        store
            .expect_list_transactions_by_wallet_and_time_range()
            .returning(|_, _, _, _| Ok(vec![]));
        store.expect_upsert_registration().returning(move |key, _, _| {
            Ok(forohtoo_types::Registration {
                key: key.clone(),
                poll_interval: Duration::from_secs(30),
                associated_token_address: None,
                last_poll_time: None,
                status: RegistrationStatus::Active,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
        });

        let mut event_bus = MockEventBus::new();
        event_bus.expect_consume().returning(move |_, _| {
            let matching = matching.clone();
            let mut consumer = MockEventConsumer::new();
            let mut delivered = false;
            consumer.expect_next().returning(move || {
                if delivered {
                    return Ok(None);
                }
                delivered = true;
                Ok(Some(ConsumedEvent::new(
                    PublishedEvent { transaction: matching.clone(), published_at: chrono::Utc::now() },
                    Box::new(NoopAcker),
                )))
            });
            Ok(Box::new(consumer) as Box<dyn forohtoo_event_bus::EventConsumer>)
        });

        let mut workflow_store = MockWorkflowStore::new();
        workflow_store.expect_get_payment_workflow().returning(|_| Ok(None));
        workflow_store.expect_create_payment_workflow().returning(move |id, target, _, invoice| {
            let mut record = pending_record(&target, &invoice);
            record.workflow_id = id;
            Ok(record)
        });
        workflow_store.expect_complete_payment_workflow().returning(|_, _| Ok(()));

        let mut schedule_runtime = MockScheduleRuntime::new();
        schedule_runtime.expect_create_schedule().returning(|_, _, _| Ok(()));

        let runtime = InProcessWorkflowRuntime::new(
            Arc::new(store),
            Arc::new(workflow_store),
            Arc::new(event_bus),
            Arc::new(schedule_runtime),
        );

        let record = runtime.start_payment_workflow(wf_input).await.unwrap();
        assert_eq!(record.status, PaymentWorkflowStatus::Pending);

        // The match happens on a spawned task; give it a moment to run.
        sleep(StdDuration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn no_payment_before_timeout_expires_the_workflow() {
        let target = target();
        let wf_input = input(target.clone());

        let mut store = MockStore::new();
        store
            .expect_list_transactions_by_wallet_and_time_range()
            .returning(|_, _, _, _| Ok(vec![]));

        let mut event_bus = MockEventBus::new();
        event_bus
            .expect_consume()
            .returning(|_, _| Ok(Box::new(HangingConsumer) as Box<dyn forohtoo_event_bus::EventConsumer>));

        let mut workflow_store = MockWorkflowStore::new();
        workflow_store.expect_get_payment_workflow().returning(|_| Ok(None));
        workflow_store.expect_create_payment_workflow().returning(move |id, target, _, invoice| {
            let mut record = pending_record(&target, &invoice);
            record.workflow_id = id;
            Ok(record)
        });
        workflow_store.expect_expire_payment_workflow().returning(|_| Ok(()));

        let runtime = InProcessWorkflowRuntime::new(
            Arc::new(store),
            Arc::new(workflow_store),
            Arc::new(event_bus),
            Arc::new(MockScheduleRuntime::new()),
        );

        runtime.start_payment_workflow(wf_input).await.unwrap();
        // payment_timeout is 50ms; give the spawned task time to time out
        // and record the expiry.
        sleep(StdDuration::from_millis(150)).await;
    }

    #[tokio::test]
    async fn non_matching_live_transactions_fail_the_workflow_once_the_stream_ends() {
        let target = target();
        let wf_input = input(target.clone());

        let mut store = MockStore::new();
        store
            .expect_list_transactions_by_wallet_and_time_range()
            .returning(|_, _, _, _| Ok(vec![]));

        let mut event_bus = MockEventBus::new();
        event_bus.expect_consume().returning(|_, _| {
            let mut consumer = MockEventConsumer::new();
            consumer.expect_next().returning(|| Ok(None));
            Ok(Box::new(consumer) as Box<dyn forohtoo_event_bus::EventConsumer>)
        });

        let mut workflow_store = MockWorkflowStore::new();
        workflow_store.expect_get_payment_workflow().returning(|_| Ok(None));
        workflow_store.expect_create_payment_workflow().returning(move |id, target, _, invoice| {
            let mut record = pending_record(&target, &invoice);
            record.workflow_id = id;
            Ok(record)
        });
        workflow_store.expect_fail_payment_workflow().returning(|_, _| Ok(()));

        let runtime = InProcessWorkflowRuntime::new(
            Arc::new(store),
            Arc::new(workflow_store),
            Arc::new(event_bus),
            Arc::new(MockScheduleRuntime::new()),
        );

        runtime.start_payment_workflow(wf_input).await.unwrap();
        sleep(StdDuration::from_millis(100)).await;
    }
}
