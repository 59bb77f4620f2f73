//! Persisted session records.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// A live session: id plus the Metadata API endpoint bound to it.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub metadata_url: String,
}

impl std::fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInfo")
            .field("session_id", &"[REDACTED]")
            .field("metadata_url", &self.metadata_url)
            .finish()
    }
}

impl SessionInfo {
    /// A stored session is only usable when both fields are present.
    pub fn is_complete(&self) -> bool {
        !self.session_id.is_empty() && !self.metadata_url.is_empty()
    }
}

/// Session record as persisted, with validation fingerprints and a
/// timestamp for debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub session: SessionInfo,
    pub creds_fingerprint: String,
    pub connection_fingerprint: String,
    pub stored_at: chrono::DateTime<chrono::Utc>,
}

/// File-based session store.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store at the given file path.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the stored session. Missing or malformed files are a cache
    /// miss, not an error.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&json) {
            Ok(stored) => Ok(Some(stored)),
            Err(err) => {
                debug!(path = %self.path.display(), %err, "session cache malformed, ignoring");
                Ok(None)
            }
        }
    }

    /// Save the session record, creating parent directories as needed.
    pub fn save(&self, stored: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(stored)?;
        std::fs::write(&self.path, json)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    /// Delete the stored session if present.
    pub fn delete(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
