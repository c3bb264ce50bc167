#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("oracle returned non-success status {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("oracle JSON-RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },
    #[error("oracle response was missing an expected field: {0}")]
    MalformedResponse(&'static str),
}

impl OracleError {
    /// Network hiccups and 5xx responses are worth retrying; a malformed
    /// payload or an RPC-level error usually means the same call will fail
    /// again the same way.
    pub fn is_recoverable(&self) -> bool {
        match self {
            OracleError::Request(e) => e.is_timeout() || e.is_connect(),
            OracleError::BadStatus(status) => status.is_server_error(),
            OracleError::JsonRpc { .. } => false,
            OracleError::MalformedResponse(_) => false,
        }
    }
}
