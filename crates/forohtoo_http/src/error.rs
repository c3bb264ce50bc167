use axum::response::{IntoResponse, Response};
use axum::Json;
use forohtoo_schedule::ScheduleError;
use forohtoo_storage::StorageError;
use forohtoo_types::RegistrationError;
use forohtoo_workflow::WorkflowError;
use hyper::StatusCode;
use serde_json::json;
use tracing::{debug, error};
use validator::ValidationErrors;

pub type HttpResult<T> = Result<T, HttpError>;

/// Errors surfaced across the Registration API (spec.md §4.9/§6). Mirrors the
/// teacher's `HttpServerError`: wrap the backend's native error type,
/// implement `IntoResponse` directly rather than threading status codes
/// through every handler.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("server misconfigured: {0}")]
    Configuration(String),
}

impl HttpError {
    fn status_code(&self) -> StatusCode {
        match self {
            HttpError::Validation(_) | HttpError::Registration(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Storage(_)
            | HttpError::Schedule(_)
            | HttpError::Workflow(_)
            | HttpError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
