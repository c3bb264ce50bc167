//! Poller: one poll cycle for one monitored triple (spec.md §4.3). Pulls
//! recent signatures from the RPC oracle, diffs against what the Store
//! already knows, persists new transactions, and publishes them to the
//! event bus. Scheduling *when* to run a cycle is the Schedule Plane's job.

mod error;
mod poll;

pub use error::PollerError;
pub use poll::{PollCycleOutcome, PollerActivity, DEFAULT_SIGNATURE_LIMIT, MAX_SIGNATURE_LIMIT};
