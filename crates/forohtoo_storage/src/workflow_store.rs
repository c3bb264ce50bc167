use async_trait::async_trait;
use forohtoo_types::{Invoice, PaymentWorkflow, RegistrationKey};

use crate::error::StorageError;

/// Backs the Payment Workflow's durable state (spec.md §4.8), kept as a
/// trait distinct from `Store` since it serves a different caller
/// (`forohtoo_workflow`, not the Poller/Schedule Plane) even though both are
/// implemented against the same Postgres database.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Idempotent: if `workflow_id` already exists, returns the existing row
    /// instead of erroring (spec.md §4.8's "starting a workflow whose id
    /// already exists returns the existing run").
    async fn create_payment_workflow(
        &self,
        workflow_id: String,
        target: RegistrationKey,
        poll_interval_secs: u64,
        invoice: Invoice,
    ) -> Result<PaymentWorkflow, StorageError>;

    async fn get_payment_workflow(
        &self,
        workflow_id: &str,
    ) -> Result<Option<PaymentWorkflow>, StorageError>;

    /// Re-arms an existing row that's `Expired` (or a stale `Pending` whose
    /// invoice already lapsed) with a fresh invoice and `Pending` status, so
    /// a new POST for the same address gets a usable invoice instead of the
    /// frozen terminal record `create_payment_workflow`'s `ON CONFLICT`
    /// no-op would otherwise hand back forever.
    async fn reset_payment_workflow(
        &self,
        workflow_id: &str,
        poll_interval_secs: u64,
        invoice: Invoice,
    ) -> Result<PaymentWorkflow, StorageError>;

    async fn complete_payment_workflow(
        &self,
        workflow_id: &str,
        payment_signature: String,
    ) -> Result<(), StorageError>;

    async fn fail_payment_workflow(
        &self,
        workflow_id: &str,
        error_message: String,
    ) -> Result<(), StorageError>;

    async fn expire_payment_workflow(&self, workflow_id: &str) -> Result<(), StorageError>;
}
