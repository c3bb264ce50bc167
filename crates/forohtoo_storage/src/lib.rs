//! The durable store (spec.md §4.1): registrations and transactions, backed
//! by Postgres via `sqlx`. A relational backend rather than an embedded KV
//! engine, since the data model here needs genuine range scans over
//! `block_time` that a KV store does not give for free.

mod error;
mod pg;
mod pg_workflow;
mod store;
mod workflow_store;

pub use error::StorageError;
pub use pg::PgStore;
pub use store::{
    CreateTransactionOutcome, CreateTransactionParams, RegistrationFilter, Store,
};
pub use workflow_store::WorkflowStore;

#[cfg(any(test, feature = "testing"))]
pub use store::MockStore;
#[cfg(any(test, feature = "testing"))]
pub use workflow_store::MockWorkflowStore;
