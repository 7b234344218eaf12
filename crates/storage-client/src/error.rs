//! Client error types

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A required argument was missing or empty
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Local file could not be read
    #[error("IO error on {}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request error (connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The storage service answered with an unexpected status
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ClientError {
    /// The normalized API error, if this is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status code of an API error
    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|e| e.status)
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// True for errors raised before any request was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidArgument(_) | Self::Io { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error returned by the storage service API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Error message from the response, or the raw body
    pub message: String,
    /// Raw response body
    pub body: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = if self.message.is_empty() {
            &self.body
        } else {
            &self.message
        };
        write!(f, "storage service returned status {}: {}", self.status, detail)
    }
}

impl std::error::Error for ApiError {}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    /// Normalize an error response body.
    ///
    /// `error` is preferred over `message`; anything that is not a JSON object
    /// carrying one of them falls back to the raw body text.
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let parsed = serde_json::from_str::<ErrorBody>(&body).ok().and_then(|e| {
            let error = e.error.filter(|s| !s.is_empty());
            let message = e.message.filter(|s| !s.is_empty());
            error.or(message)
        });

        Self {
            status,
            message: parsed.unwrap_or_else(|| body.clone()),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field_wins_over_message() {
        let err = ApiError::from_response(
            400,
            r#"{"success":false,"message":"Bad request","status":400,"error":"file too large"}"#,
        );
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "file too large");
        assert!(err.body.contains("Bad request"));
    }

    #[test]
    fn test_message_used_without_error() {
        let err = ApiError::from_response(404, r#"{"message":"File not found"}"#);
        assert_eq!(err.message, "File not found");
    }

    #[test]
    fn test_empty_error_falls_through_to_message() {
        let err = ApiError::from_response(500, r#"{"message":"oops","error":""}"#);
        assert_eq!(err.message, "oops");
    }

    #[test]
    fn test_non_json_body_used_verbatim() {
        let err = ApiError::from_response(502, "boom");
        assert_eq!(err.message, "boom");
        assert_eq!(err.body, "boom");
    }

    #[test]
    fn test_json_without_known_fields_uses_body() {
        let body = r#"{"detail":"nope"}"#;
        let err = ApiError::from_response(422, body);
        assert_eq!(err.message, body);
    }

    #[test]
    fn test_display_and_helpers() {
        let err: ClientError = ApiError::from_response(404, r#"{"error":"not found"}"#).into();
        assert_eq!(
            err.to_string(),
            "storage service returned status 404: not found"
        );
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert!(!err.is_local());

        let local = ClientError::InvalidArgument("file ID is required".into());
        assert!(local.is_local());
        assert_eq!(local.status(), None);
    }
}
