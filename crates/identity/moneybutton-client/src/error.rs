//! Error types for the MoneyButton client.

use crate::types::ApiError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type MoneyButtonResult<T> = Result<T, MoneyButtonError>;

/// Every way a MoneyButton call can fail.
#[derive(Debug, Error)]
pub enum MoneyButtonError {
    /// A required argument was empty; no request was sent
    #[error("missing required parameter: {name}")]
    MissingParameter { name: &'static str },

    /// The exchange itself failed (connect, timeout, cancellation, body read)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Unexpected status with a structured error body
    #[error("{}", upstream_message(.status, .errors))]
    Upstream {
        status: u16,
        errors: Vec<ApiError>,
        jsonapi_version: Option<String>,
    },

    /// Unexpected status with an empty or unreadable body
    #[error("{}", opaque_message(.status, .source))]
    UpstreamOpaque {
        status: u16,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Expected status, but the body does not match the result shape
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn upstream_message(status: &u16, errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return format!("request failed with status code: {}", status);
    }

    errors
        .iter()
        .map(|e| format!("error: {}", e.detail))
        .collect::<Vec<_>>()
        .join(" ")
}

fn opaque_message(status: &u16, source: &Option<serde_json::Error>) -> String {
    match source {
        Some(err) => format!(
            "request failed with status code: {} (unreadable error body: {})",
            status, err
        ),
        None => format!("request failed with status code: {}", status),
    }
}

impl MoneyButtonError {
    pub fn missing_parameter(name: &'static str) -> Self {
        Self::MissingParameter { name }
    }

    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// HTTP status associated with the failure, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } | Self::UpstreamOpaque { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Structured entries reported by the API, empty for every other kind
    pub fn upstream_errors(&self) -> &[ApiError] {
        match self {
            Self::Upstream { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Name of the missing argument for parameter errors
    pub fn missing_parameter_name(&self) -> Option<&'static str> {
        match self {
            Self::MissingParameter { name } => Some(*name),
            _ => None,
        }
    }

    /// Whether issuing the same call again could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => !err.is_cancelled(),
            Self::Upstream { status, .. } | Self::UpstreamOpaque { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Failure reported by an [`crate::HttpTransport`]
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    status: Option<u16>,
    timeout: bool,
    cancelled: bool,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            status: None,
            timeout: false,
            cancelled: false,
            source: None,
        }
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self {
            timeout: true,
            ..Self::new(message)
        }
    }

    /// The caller aborted the exchange before a response arrived
    pub fn cancelled<S: Into<String>>(message: S) -> Self {
        Self {
            cancelled: true,
            ..Self::new(message)
        }
    }

    /// Record the status of a partially received response
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_timeout(&self) -> bool {
        self.timeout
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: format!("HTTP request failed: {}", err),
            status: err.status().map(|s| s.as_u16()),
            timeout: err.is_timeout(),
            cancelled: false,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(detail: &str) -> ApiError {
        ApiError {
            detail: detail.to_string(),
            id: "x".to_string(),
            status: 400,
            title: "Bad Request".to_string(),
        }
    }

    #[test]
    fn test_missing_parameter_message() {
        let err = MoneyButtonError::missing_parameter("client_id");
        assert_eq!(err.to_string(), "missing required parameter: client_id");
        assert_eq!(err.missing_parameter_name(), Some("client_id"));
        assert_eq!(err.status(), None);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_upstream_message_joins_details_in_order() {
        let err = MoneyButtonError::Upstream {
            status: 400,
            errors: vec![api_error("first problem"), api_error("second problem")],
            jsonapi_version: Some("1.0".to_string()),
        };

        assert_eq!(err.to_string(), "error: first problem error: second problem");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.upstream_errors().len(), 2);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_upstream_without_entries_mentions_status() {
        let err = MoneyButtonError::Upstream {
            status: 422,
            errors: vec![],
            jsonapi_version: None,
        };

        assert!(err.to_string().contains("422"));
    }

    #[test]
    fn test_opaque_messages() {
        let err = MoneyButtonError::UpstreamOpaque {
            status: 500,
            source: None,
        };
        assert_eq!(err.to_string(), "request failed with status code: 500");
        assert!(err.is_retryable());

        let parse_err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = MoneyButtonError::UpstreamOpaque {
            status: 502,
            source: Some(parse_err),
        };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("unreadable error body"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_transport_error() {
        let err: MoneyButtonError = TransportError::timeout("deadline exceeded")
            .with_status(504)
            .into();

        assert_eq!(err.to_string(), "deadline exceeded");
        assert_eq!(err.status(), Some(504));
        assert!(err.is_retryable());

        if let MoneyButtonError::Transport(inner) = &err {
            assert!(inner.is_timeout());
            assert_eq!(inner.message(), "deadline exceeded");
        } else {
            panic!("Expected transport error");
        }
    }

    #[test]
    fn test_transport_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = TransportError::new("connect failed").with_source(io);

        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.status(), None);
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_cancelled_transport_error_is_not_retryable() {
        let err: MoneyButtonError = TransportError::cancelled("request cancelled").into();

        assert_eq!(err.status(), None);
        assert!(!err.is_retryable());
        match &err {
            MoneyButtonError::Transport(inner) => {
                assert!(inner.is_cancelled());
                assert!(!inner.is_timeout());
            }
            other => panic!("Expected transport error, got {:?}", other),
        }
    }
}
