//! Error taxonomy for the HTTP client.
//!
//! Every failed call is classified into one [`ApiError`] variant. The
//! variant decides the toast message the user sees and whether the
//! refresh pipeline may retry the request (only [`ApiError::SessionExpired`]
//! enters that path, and only once per request).

use serde::Deserialize;

/// A failed API call, classified by cause.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The access token was rejected and could not be refreshed, or the
    /// session was never established. Fatal to the session.
    #[error("Session expired")]
    SessionExpired,

    /// The backend refused the action for this account (403).
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The requested resource does not exist (404).
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The backend rejected the payload with field-level messages (400).
    ///
    /// `message` concatenates every field message; `fields` preserves the
    /// raw structure so forms can highlight individual inputs.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        fields: serde_json::Value,
    },

    /// A 400 without field-level detail.
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Any 5xx (or otherwise unclassified) status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Error body shape produced by the backend:
/// `{"error": "...", "code": "...", "errors": {field: [messages]}?}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

impl ApiError {
    /// Classify a non-success response from its status code and raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| b.error.clone())
            .unwrap_or_else(|| default_message(status).to_string());

        match status {
            401 => ApiError::SessionExpired,
            403 => ApiError::Forbidden { message },
            404 => ApiError::NotFound { message },
            400 => match parsed.and_then(|b| b.errors) {
                Some(fields) => ApiError::Validation {
                    message: join_field_messages(&fields).unwrap_or(message),
                    fields,
                },
                None => ApiError::BadRequest { message },
            },
            _ => ApiError::Server { status, message },
        }
    }

    /// Human-readable message for the toast collaborator.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::SessionExpired => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ApiError::Forbidden { message }
            | ApiError::NotFound { message }
            | ApiError::BadRequest { message }
            | ApiError::Validation { message, .. } => message.clone(),
            ApiError::Server { .. } => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Could not reach the server. Check your connection.".to_string()
            }
        }
    }
}

/// Classify a 401 from a public endpoint (login, register): a credential
/// problem, not an expired session, so it must not enter the refresh path.
pub(crate) fn public_unauthorized(body: &str) -> ApiError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .and_then(|b| b.error)
        .unwrap_or_else(|| "Invalid email or password".to_string());
    ApiError::BadRequest { message }
}

/// Fallback message when the body carries none.
fn default_message(status: u16) -> &'static str {
    match status {
        400 => "The request was invalid",
        403 => "You don't have permission to do that",
        404 => "The requested resource was not found",
        _ => "The server reported an error",
    }
}

/// Flatten `{field: [messages]}` into one sentence.
fn join_field_messages(fields: &serde_json::Value) -> Option<String> {
    let map = fields.as_object()?;
    let mut parts = Vec::new();
    for messages in map.values() {
        match messages {
            serde_json::Value::Array(list) => {
                parts.extend(list.iter().filter_map(|m| m.as_str().map(str::to_string)));
            }
            serde_json::Value::String(s) => parts.push(s.clone()),
            _ => {}
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(". "))
    }
}
