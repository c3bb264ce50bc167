//! Payment Workflow (spec.md §4.8): builds an invoice, waits for a matching
//! on-chain payment via [`forohtoo_sse::await_transaction`], and on success
//! activates the target Registration and its schedule. Driven by a
//! [`WorkflowRuntime`] abstraction standing in for an external durable
//! workflow engine.

mod error;
mod runtime;

pub use error::WorkflowError;
pub use runtime::{InProcessWorkflowRuntime, PaymentWorkflowInput, WorkflowRuntime};

#[cfg(any(test, feature = "testing"))]
pub use runtime::MockWorkflowRuntime;
