//! Schedule Plane (spec.md §4.4): maps each `active` Registration to a
//! periodic poll-cycle invocation, and keeps that mapping self-healing via a
//! periodic reconciliation sweep.

mod error;
mod in_process;
mod reconcile_loop;
mod runtime;
mod schedule;

pub use error::ScheduleError;
pub use in_process::InProcessScheduleRuntime;
pub use reconcile_loop::{reconcile_stream, DEFAULT_RECONCILE_INTERVAL};
pub use runtime::{ScheduleHandler, ScheduleRuntime};
pub use schedule::{delete, reconcile, upsert, ReconcileOutcome};

#[cfg(any(test, feature = "testing"))]
pub use runtime::MockScheduleRuntime;
