//! Error types for packforge-soap.

use crate::types::SoapFault;

/// Fault code Salesforce returns when a session id is expired or bogus.
pub const INVALID_SESSION_CODE: &str = "sf:INVALID_SESSION_ID";

/// Result type alias for packforge-soap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for packforge-soap operations.
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

    /// Returns true if this error is the `sf:INVALID_SESSION_ID` fault.
    ///
    /// This is the only fault callers may recover from by re-authenticating;
    /// every other fault is terminal for the current run.
    pub fn is_invalid_session(&self) -> bool {
        matches!(&self.kind, ErrorKind::SoapFault(fault) if fault.fault_code == INVALID_SESSION_CODE)
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// SOAP fault returned by the service.
    #[error("{0}")]
    SoapFault(SoapFault),

    /// Response did not contain what we expected.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// More list queries than the API accepts in one call.
    #[error("Too many list queries in one call: {count} (limit is {limit})")]
    TooManyQueries { count: usize, limit: usize },

    /// Invalid input to a client call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::with_source(ErrorKind::Http(err.to_string()), err)
    }
}
