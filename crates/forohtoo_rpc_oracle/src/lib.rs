//! The blockchain RPC oracle (spec.md §4.2): an interface-only boundary the
//! Poller consumes. `HttpRpcOracle` is a concrete JSON-RPC client; tests and
//! other crates depend on the `RpcOracle` trait instead.

mod error;
mod http;
mod oracle;

pub use error::OracleError;
pub use http::HttpRpcOracle;
pub use oracle::{RpcOracle, SignatureInfo, TransactionEffect};

#[cfg(any(test, feature = "testing"))]
pub use oracle::MockRpcOracle;
