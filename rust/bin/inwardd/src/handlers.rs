//! Ledger handlers: form submission and workbook download.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use inward_ledger::{Submission, EXPORT_FILE_NAME};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::routes::AppState;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const SAVED_MESSAGE: &str = "Data saved successfully!";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `POST /submit`: append one row built from the form fields.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let submission = parse_submission(&headers, &body)?;
    let ledger = Arc::clone(&state.ledger);
    run_blocking(move || ledger.append(&submission)).await?;

    Ok(Json(MessageResponse {
        message: SAVED_MESSAGE.to_string(),
    }))
}

/// `GET /download`: the whole workbook as an attachment.
pub async fn download(State(state): State<AppState>) -> Result<Response, ApiError> {
    let ledger = Arc::clone(&state.ledger);
    let data = run_blocking(move || ledger.export()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        data,
    )
        .into_response())
}

/// Run a ledger operation on the blocking pool; the store does file I/O
/// and may wait on its write lock.
async fn run_blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, inward_ledger::LedgerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

/// Decode the request body the way a JSON body parser does.
///
/// Bodies without a JSON content type, and empty JSON bodies, count as an
/// empty submission. A JSON array also carries none of the form fields.
/// Any other non-object JSON value is rejected.
fn parse_submission(headers: &HeaderMap, body: &[u8]) -> Result<Submission, ApiError> {
    if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Submission::default());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))?;
    match value {
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| ApiError::BadRequest(format!("invalid submission: {}", e))),
        Value::Array(_) => Ok(Submission::default()),
        _ => Err(ApiError::BadRequest(
            "request body must be a JSON object".to_string(),
        )),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
