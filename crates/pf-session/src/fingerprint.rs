//! Salted fingerprints for cache validation.
//!
//! The session cache must never hold anything that can be replayed from a
//! checked-in file: we store fingerprints of the credentials and of the
//! connection endpoint instead, salted with a machine-local identifier so a
//! cache file copied to another machine is just a miss.

use sha2::{Digest, Sha256};

use crate::credentials::LoginCredentials;

/// A machine-local salt. Stability matters more than secrecy here; if the
/// identifier changes we simply log in again.
pub(crate) fn machine_salt() -> String {
    if let Ok(id) = std::fs::read_to_string("/etc/machine-id") {
        let id = id.trim();
        if !id.is_empty() {
            return id.to_string();
        }
    }
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "packforge".to_string())
}

/// Non-reversible fingerprint of the credentials.
pub(crate) fn credentials_fingerprint(creds: &LoginCredentials, salt: &str) -> String {
    let serialized = serde_json::to_string(creds).unwrap_or_default();
    digest(&serialized, salt)
}

/// Fingerprint of the connection endpoint the session was acquired against.
pub(crate) fn connection_fingerprint(endpoint: &str, salt: &str) -> String {
    // Normalize so trivially different spellings of one endpoint agree.
    let normalized = url::Url::parse(endpoint)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| endpoint.to_string());
    digest(&normalized, salt)
}

fn digest(value: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}
