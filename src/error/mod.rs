//! Client error types and server message extraction.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Client-level errors.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {}", describe_body(.body))]
    Status { status: StatusCode, body: Value },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl ClientError {
    /// HTTP status of a rejected request, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Human-readable message supplied by the server in the `detail` field.
    pub fn detail(&self) -> Option<String> {
        match self {
            ClientError::Status { body, .. } => detail_message(body),
            _ => None,
        }
    }
}

/// `detail` is either a plain string or a list of validation entries carrying `msg`.
fn detail_message(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

fn describe_body(body: &Value) -> String {
    match detail_message(body) {
        Some(detail) => detail,
        None if body.is_null() => "empty response".to_string(),
        None => body.to_string(),
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
