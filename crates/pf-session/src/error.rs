//! Error types for packforge-session.
//!
//! Error messages avoid including credential values.

/// Result type alias for packforge-session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for packforge-session operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// SOAP transport or fault error.
    #[error("SOAP error: {0}")]
    Soap(String),

    /// Session store I/O failure.
    #[error("Session store error: {0}")]
    Store(String),

    /// Invalid credentials configuration.
    #[error("Credential configuration error: {0}")]
    Config(String),
}

impl From<packforge_soap::Error> for Error {
    fn from(err: packforge_soap::Error) -> Self {
        Error {
            kind: ErrorKind::Soap(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Store(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Store(err.to_string()), err)
    }
}
