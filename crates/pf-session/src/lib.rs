//! # packforge-session
//!
//! Session caching and re-authentication.
//!
//! A session survives between runs in a small JSON file next to the other
//! caches. The file never holds credentials - it holds the session id plus
//! two salted fingerprints (credentials, connection endpoint) used to decide
//! whether the cached session may still belong to the current
//! configuration. A mismatch is a cache miss, nothing more.
//!
//! [`SessionManager::with_session`] is the one retry-with-refresh point in
//! the whole system: it runs an action with a valid session and, if the
//! service answers `sf:INVALID_SESSION_ID`, logs in again and re-runs the
//! action exactly once.

mod credentials;
mod error;
mod fingerprint;
mod manager;
mod store;

pub use credentials::LoginCredentials;
pub use error::{Error, ErrorKind, Result};
pub use manager::SessionManager;
pub use store::{FileSessionStore, SessionInfo, StoredSession};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
