//! Error types for the REST service layer.
//!
//! # Design
//! A non-200 response is the only failure the service itself detects. When
//! the transport attached its own error to the response, that error is
//! surfaced unchanged through `Transport`; otherwise the transport's textual
//! message becomes a `Status` error. The remaining variants cover the local
//! steps around the round-trip: encoding the payload, decoding the body,
//! cancellation and URL handling.

use thiserror::Error;

/// Error value a transport can attach to an `ApiResponse`.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `ApiService` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport reported a failure and supplied the error itself.
    #[error(transparent)]
    Transport(TransportError),

    /// Non-200 status without a transport error; `message` is the
    /// transport's error message, verbatim.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request payload could not be serialized, or did not serialize to
    /// a JSON object when query parameters were required.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The cancellation token fired before the transport completed.
    #[error("request cancelled")]
    Cancelled,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct Reset;

    #[test]
    fn status_error_displays_message_verbatim() {
        let err = ApiError::Status {
            status: 502,
            message: "upstream unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "upstream unavailable");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn transport_error_is_transparent() {
        let err = ApiError::Transport(Box::new(Reset));
        assert_eq!(err.to_string(), "connection reset");
        assert!(err.status().is_none());
    }

    #[test]
    fn url_parse_error_converts() {
        let err: ApiError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }
}
