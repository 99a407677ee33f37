//! Client error types.

use serde_json::Value;
use thiserror::Error;

/// Result type for backend calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-success status.
    ///
    /// `detail` is the server-provided message when the body carried one.
    #[error("{}", .detail.as_deref().unwrap_or(.body.as_str()))]
    Api {
        status: u16,
        detail: Option<String>,
        body: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl ClientError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Build an error from a failed response body.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let detail = extract_detail(&body);

        if status == 404 {
            return Self::NotFound(detail.unwrap_or(body));
        }

        let body = if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        };

        Self::Api { status, detail, body }
    }

    /// HTTP status carried by this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::NotFound(_) => Some(404),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.http_status() == Some(404)
    }

    /// Connection-level failure (refused, timeout, DNS).
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(e) if e.status().is_none())
    }

    /// Message shown to the operator.
    ///
    /// The server's `detail` when present, otherwise the raw error.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { detail: Some(detail), .. } => detail.clone(),
            ClientError::NotFound(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Pull `detail` out of an error body.
///
/// Handles both the plain `{"detail": "..."}` shape and the validation-list
/// shape `{"detail": [{"loc": [...], "msg": "..."}]}`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<String> = items.iter().filter_map(validation_item_message).collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        Value::Null => None,
        Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

fn validation_item_message(item: &Value) -> Option<String> {
    let msg = item.get("msg")?.as_str()?;
    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.iter().rev().find_map(Value::as_str).map(String::from));

    Some(match field {
        Some(field) => format!("{}: {}", field, msg),
        None => msg.to_string(),
    })
}
