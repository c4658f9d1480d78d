//! Error types for object transfers.

use mita_core::{BoxedError, ErrorKind};
use thiserror::Error;

/// Result type alias for object transfer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Caller input rejected before any credential fetch or transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The object name or key is empty.
    #[error("object key must not be empty")]
    EmptyKey,
    /// The key cannot be stored verbatim.
    #[error("object key is not a valid storage path")]
    InvalidKey,
    /// No file or bytes were selected for upload.
    #[error("no payload selected for upload")]
    MissingPayload,
    /// The speed limit is not a positive number of KB/s.
    #[error("speed limit must be a positive number of KB/s")]
    InvalidSpeedLimit,
    /// The timeout is zero.
    #[error("timeout must be positive")]
    InvalidTimeout,
    /// The part size is zero.
    #[error("part size must be positive")]
    InvalidPartSize,
}

/// Error type for object transfer operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request failed validation.
    #[error("invalid transfer request: {0}")]
    Validation(#[from] ValidationError),

    /// Fetching or refreshing the credential bundle failed.
    #[error("credential error: {message}")]
    Credential {
        /// What went wrong.
        message: String,
        /// Underlying failure, when any.
        #[source]
        source: Option<BoxedError>,
    },

    /// The object store rejected or failed the operation.
    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A checkpoint could not be encoded or decoded.
    #[error("checkpoint serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a credential error without an underlying cause.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a credential error wrapping `source`.
    pub fn credential_from(message: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::Credential {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Whether the store reported the object or upload as unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(object_store::Error::NotFound { .. }))
    }

    /// Whether this failure originates from the credential bundle, either
    /// directly or through a refresh inside the object store client.
    pub fn is_credential(&self) -> bool {
        match self {
            Self::Credential { .. } => true,
            Self::Store(object_store::Error::Generic { source, .. }) => source
                .downcast_ref::<Self>()
                .is_some_and(|inner| matches!(inner, Self::Credential { .. })),
            _ => false,
        }
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        if self.is_credential() {
            return ErrorKind::Credential;
        }

        match self {
            Self::Validation(_) => ErrorKind::InvalidInput,
            Self::Credential { .. } => ErrorKind::Credential,
            Self::Store(err) => match err {
                object_store::Error::NotFound { .. } => ErrorKind::NotFound,
                object_store::Error::PermissionDenied { .. } => ErrorKind::Authorization,
                object_store::Error::Unauthenticated { .. } => ErrorKind::Authentication,
                _ => ErrorKind::ExternalError,
            },
            Self::Io(_) => ErrorKind::InternalError,
            Self::Serde(_) => ErrorKind::Serialization,
            Self::Config(_) => ErrorKind::Configuration,
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
