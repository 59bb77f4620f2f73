//! The metadata describe catalog, cached on disk.

use std::path::{Path, PathBuf};

use packforge_session::SessionManager;
use packforge_soap::{MetadataClient, MetadataType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Persisted describe result, keyed by API version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCatalog {
    pub api_version: String,
    pub organization_namespace: Option<String>,
    pub metadata_objects: Vec<MetadataType>,
}

/// File-backed cache in front of `describeMetadata`.
///
/// There is no TTL: the record is reused until the cache directory is
/// cleared explicitly. A stored record only counts when it parses, matches
/// the requested API version, and carries a non-empty descriptor list -
/// anything else is a miss, never an error.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    path: PathBuf,
}

impl CatalogCache {
    /// Create a cache backed by the given file path.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the catalog: cached when valid, otherwise described through the
    /// session manager and persisted.
    pub async fn get(
        &self,
        manager: &SessionManager,
        api_version: &str,
    ) -> Result<StoredCatalog> {
        if let Some(stored) = self.load_valid(api_version) {
            debug!("using cached metadata describe");
            return Ok(stored);
        }

        debug!("metadata describe cache miss");
        let describe = manager
            .with_session(|session| async move {
                let client =
                    MetadataClient::from_parts(session.metadata_url, session.session_id);
                client.describe_metadata(api_version).await
            })
            .await?;

        let stored = StoredCatalog {
            api_version: api_version.to_string(),
            organization_namespace: describe.organization_namespace,
            metadata_objects: describe.metadata_objects,
        };
        self.save(&stored)?;

        Ok(stored)
    }

    fn load_valid(&self, api_version: &str) -> Option<StoredCatalog> {
        if !self.path.exists() {
            return None;
        }

        let json = std::fs::read_to_string(&self.path).ok()?;
        let stored: StoredCatalog = match serde_json::from_str(&json) {
            Ok(stored) => stored,
            Err(err) => {
                debug!(path = %self.path.display(), %err, "catalog cache malformed, ignoring");
                return None;
            }
        };

        if stored.api_version != api_version || stored.metadata_objects.is_empty() {
            debug!("catalog cache does not match requested version, ignoring");
            return None;
        }

        Some(stored)
    }

    fn save(&self, stored: &StoredCatalog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(stored)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
