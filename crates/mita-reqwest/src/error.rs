//! Error types for the request gateway.

use mita_core::ErrorKind;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for gateway operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The method is not one of GET, POST, PUT or DELETE.
    #[error("unsupported request method `{0}`")]
    UnsupportedMethod(String),
    /// The request did not complete within the configured timeout.
    #[error("http timeout")]
    Timeout(#[source] reqwest::Error),
    /// The server answered with a status other than 200.
    #[error("HTTP status {status}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },
    /// The envelope carried a code outside the configured success set.
    #[error("request rejected with code {code}{}", msg.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    Envelope {
        /// Application-level code.
        code: i64,
        /// Application-level message.
        msg: Option<String>,
        /// Backend request identifier, when present.
        request_id: Option<String>,
        /// Raw envelope.
        body: serde_json::Value,
    },
    /// Any other transport failure (connection refused, TLS, decoding).
    #[error("HTTP error: {0}")]
    Transport(#[source] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A header name or value could not be encoded.
    #[error("invalid header `{0}`")]
    InvalidHeader(String),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this is the normalized timeout marker.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Response status, when the failure came from a non-200 response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedMethod(_) | Self::InvalidHeader(_) => ErrorKind::InvalidInput,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Status { status, .. } => match *status {
                StatusCode::UNAUTHORIZED => ErrorKind::Authentication,
                StatusCode::FORBIDDEN => ErrorKind::Authorization,
                StatusCode::NOT_FOUND => ErrorKind::NotFound,
                _ => ErrorKind::ExternalError,
            },
            Self::Envelope { .. } => ErrorKind::ExternalError,
            Self::Transport(_) => ErrorKind::NetworkError,
            Self::Serde(_) => ErrorKind::Serialization,
            Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Maps a reqwest failure to [`Error::Timeout`] or [`Error::Transport`].
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }
}

impl From<Error> for mita_core::Error {
    fn from(err: Error) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        mita_core::Error::from_source(kind, err).with_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_kinds() {
        let forbidden = Error::Status {
            status: StatusCode::FORBIDDEN,
            body: String::new(),
        };
        assert_eq!(forbidden.kind(), ErrorKind::Authorization);
        assert_eq!(forbidden.status(), Some(StatusCode::FORBIDDEN));
        assert!(!forbidden.is_timeout());

        let unauthorized = Error::Status {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert_eq!(unauthorized.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_envelope_display() {
        let err = Error::Envelope {
            code: 500,
            msg: Some("server busy".into()),
            request_id: None,
            body: serde_json::Value::Null,
        };
        assert_eq!(err.to_string(), "request rejected with code 500: server busy");
        assert_eq!(err.kind(), ErrorKind::ExternalError);
    }

    #[test]
    fn test_into_core_error() {
        let err: mita_core::Error = Error::UnsupportedMethod("PATCH".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.message.as_deref().unwrap().contains("PATCH"));
        assert!(err.source.is_some());
    }
}
