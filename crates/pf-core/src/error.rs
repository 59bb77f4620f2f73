//! Error types for packforge-core.

/// Result type alias for packforge-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for packforge-core operations.
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
    /// Session acquisition or refresh failure.
    #[error("Session error: {0}")]
    Session(String),

    /// SOAP transport or fault error.
    #[error("SOAP error: {0}")]
    Soap(String),

    /// The configured policy selects nothing to fetch.
    #[error(
        "No metadata requested - specify either \"all\" or specific metadata in \"included\"; \
         if not diffing, alternatively specify \"include_special\""
    )]
    NoSelection,

    /// Cache file problem that is not recoverable as a miss.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<packforge_session::Error> for Error {
    fn from(err: packforge_session::Error) -> Self {
        Error {
            kind: ErrorKind::Session(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
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
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}
