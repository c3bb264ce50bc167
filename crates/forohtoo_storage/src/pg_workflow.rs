use std::str::FromStr;

use async_trait::async_trait;
use forohtoo_types::{
    AssetType, Invoice, Network, PaymentWorkflow, PaymentWorkflowStatus, RegistrationKey,
};
use sqlx::FromRow;

use crate::error::StorageError;
use crate::pg::PgStore;
use crate::workflow_store::WorkflowStore;

#[derive(FromRow)]
struct PaymentWorkflowRow {
    workflow_id: String,
    address: String,
    network: String,
    asset_type: String,
    token_mint: String,
    poll_interval_secs: i64,
    invoice_json: serde_json::Value,
    status: String,
    payment_signature: Option<String>,
    error_message: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl PaymentWorkflowRow {
    fn into_domain(self) -> Result<PaymentWorkflow, StorageError> {
        let token_mint = if self.token_mint.is_empty() { None } else { Some(self.token_mint) };
        let target = RegistrationKey {
            address: self.address,
            network: Network::from_str(&self.network).expect("network stored by this crate is always valid"),
            asset_type: AssetType::from_str(&self.asset_type)
                .expect("asset_type stored by this crate is always valid"),
            token_mint,
        };
        let invoice: Invoice = serde_json::from_value(self.invoice_json)?;
        Ok(PaymentWorkflow {
            workflow_id: self.workflow_id,
            target,
            poll_interval_secs: self.poll_interval_secs as u64,
            invoice,
            status: parse_status(&self.status),
            payment_signature: self.payment_signature,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn status_str(status: PaymentWorkflowStatus) -> &'static str {
    match status {
        PaymentWorkflowStatus::Pending => "pending",
        PaymentWorkflowStatus::Completed => "completed",
        PaymentWorkflowStatus::Failed => "failed",
        PaymentWorkflowStatus::Expired => "expired",
    }
}

fn parse_status(s: &str) -> PaymentWorkflowStatus {
    match s {
        "completed" => PaymentWorkflowStatus::Completed,
        "failed" => PaymentWorkflowStatus::Failed,
        "expired" => PaymentWorkflowStatus::Expired,
        _ => PaymentWorkflowStatus::Pending,
    }
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn create_payment_workflow(
        &self,
        workflow_id: String,
        target: RegistrationKey,
        poll_interval_secs: u64,
        invoice: Invoice,
    ) -> Result<PaymentWorkflow, StorageError> {
        let mint = target.token_mint.clone().unwrap_or_default();
        let invoice_json = serde_json::to_value(&invoice)?;
        let row = sqlx::query_as::<_, PaymentWorkflowRow>(
            r#"
            INSERT INTO payment_workflows
                (workflow_id, address, network, asset_type, token_mint, poll_interval_secs,
                 invoice_json, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', now(), now())
            ON CONFLICT (workflow_id) DO UPDATE SET workflow_id = payment_workflows.workflow_id
            RETURNING *
            "#,
        )
        .bind(&workflow_id)
        .bind(&target.address)
        .bind(target.network.to_string())
        .bind(target.asset_type.to_string())
        .bind(mint)
        .bind(poll_interval_secs as i64)
        .bind(invoice_json)
        .fetch_one(&self.pool())
        .await?;
        row.into_domain()
    }

    async fn reset_payment_workflow(
        &self,
        workflow_id: &str,
        poll_interval_secs: u64,
        invoice: Invoice,
    ) -> Result<PaymentWorkflow, StorageError> {
        let invoice_json = serde_json::to_value(&invoice)?;
        let row = sqlx::query_as::<_, PaymentWorkflowRow>(
            r#"
            UPDATE payment_workflows
            SET poll_interval_secs = $2, invoice_json = $3, status = 'pending',
                payment_signature = NULL, error_message = NULL, updated_at = now()
            WHERE workflow_id = $1
            RETURNING *
            "#,
        )
        .bind(workflow_id)
        .bind(poll_interval_secs as i64)
        .bind(invoice_json)
        .fetch_one(&self.pool())
        .await?;
        row.into_domain()
    }

    async fn get_payment_workflow(
        &self,
        workflow_id: &str,
    ) -> Result<Option<PaymentWorkflow>, StorageError> {
        let row = sqlx::query_as::<_, PaymentWorkflowRow>(
            "SELECT * FROM payment_workflows WHERE workflow_id = $1",
        )
        .bind(workflow_id)
        .fetch_optional(&self.pool())
        .await?;
        row.map(PaymentWorkflowRow::into_domain).transpose()
    }

    async fn complete_payment_workflow(
        &self,
        workflow_id: &str,
        payment_signature: String,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE payment_workflows SET status = $2, payment_signature = $3, updated_at = now() WHERE workflow_id = $1",
        )
        .bind(workflow_id)
        .bind(status_str(PaymentWorkflowStatus::Completed))
        .bind(payment_signature)
        .execute(&self.pool())
        .await?;
        Ok(())
    }

    async fn fail_payment_workflow(
        &self,
        workflow_id: &str,
        error_message: String,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE payment_workflows SET status = $2, error_message = $3, updated_at = now() WHERE workflow_id = $1",
        )
        .bind(workflow_id)
        .bind(status_str(PaymentWorkflowStatus::Failed))
        .bind(error_message)
        .execute(&self.pool())
        .await?;
        Ok(())
    }

    async fn expire_payment_workflow(&self, workflow_id: &str) -> Result<(), StorageError> {
        sqlx::query("UPDATE payment_workflows SET status = $2, updated_at = now() WHERE workflow_id = $1")
            .bind(workflow_id)
            .bind(status_str(PaymentWorkflowStatus::Expired))
            .execute(&self.pool())
            .await?;
        Ok(())
    }
}
