use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

use chat_backend::BackendError;

#[derive(Debug)]
pub enum BackendApiError {
    MissingAccessToken,
    InvalidBaseUrl(String),
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    EmptyPayload { endpoint: &'static str },
    Serde(JsonError),
}

/// Error envelope written by the backend: `{"error": ..., "message": ..., "code": ...}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BackendApiError {
    /// HTTP status for non-success responses.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status, _) => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for BackendApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAccessToken => write!(f, "access token is required"),
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(_, message) => write!(f, "{message}"),
            Self::EmptyPayload { endpoint } => {
                write!(f, "{endpoint} returned an empty response body")
            }
            Self::Serde(error) => write!(f, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for BackendApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for BackendApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

impl From<BackendApiError> for BackendError {
    fn from(error: BackendApiError) -> Self {
        match error {
            BackendApiError::Status(status, message) => BackendError::api(status.as_u16(), message),
            other => BackendError::unexpected(other.to_string()),
        }
    }
}

/// Resolve the user-facing message for a non-success response.
///
/// Preference order is the envelope's `message`, then its `error`, then
/// `Request failed: <status code>`.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let payload = serde_json::from_str::<ErrorPayload>(body).unwrap_or_default();
    payload
        .message
        .filter(|value| !value.trim().is_empty())
        .or_else(|| payload.error.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| format!("Request failed: {}", status.as_u16()))
}
