use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::invoice::Invoice;
use crate::registration::RegistrationKey;

/// `"payment-registration:{address}"` — embedding the address makes starting
/// a workflow for an address that already has one idempotent by id alone
/// (spec.md §4.8), so a reloaded invoice page never double-charges.
pub fn payment_workflow_id(address: &str) -> String {
    format!("payment-registration:{address}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentWorkflowStatus {
    Pending,
    Completed,
    Failed,
    Expired,
}

/// Persisted state of one Payment Workflow run (spec.md §4.8), standing in
/// for what an external workflow runtime would otherwise hold in its own
/// durable execution history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentWorkflow {
    pub workflow_id: String,
    pub target: RegistrationKey,
    pub poll_interval_secs: u64,
    pub invoice: Invoice,
    pub status: PaymentWorkflowStatus,
    pub payment_signature: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentWorkflow {
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, PaymentWorkflowStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_id_embeds_the_address() {
        assert_eq!(payment_workflow_id("abc123"), "payment-registration:abc123");
    }
}
