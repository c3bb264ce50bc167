//! SSE Fan-out (spec.md §4.6) and its programmatic sibling, the Await
//! primitive (spec.md §4.7): both are "historical replay then live
//! forwarding" over the same event bus subject, differing only in whether
//! every event is surfaced to a client or just the first predicate match.

mod await_primitive;
mod error;
mod fanout;
mod memo_filter;

pub use await_primitive::{await_transaction, Predicate};
pub use error::{AwaitError, SseError};
pub use fanout::transaction_events;
pub use memo_filter::MemoFilterExpr;
