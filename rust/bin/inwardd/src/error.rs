use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inward_ledger::LedgerError;
use thiserror::Error;

/// Error returned by the HTTP handlers.
///
/// Clients only ever see `{"message": "..."}`; there are no error codes.
/// Storage and internal failures render as `Server Error: <detail>`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body could not be parsed. HTTP 400.
    #[error("{0}")]
    BadRequest(String),

    /// Ledger storage failure. HTTP 500.
    #[error("{0}")]
    Ledger(#[from] LedgerError),

    /// Unexpected internal error (e.g. a panicked blocking task). HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the JSON body.
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Ledger(_) | ApiError::Internal(_) => format!("Server Error: {}", self),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = serde_json::json!({
            "message": self.message(),
        });
        (status, axum::Json(body)).into_response()
    }
}
