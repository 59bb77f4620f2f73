//! The run's cache directory, passed down explicitly.
//!
//! Session, catalog and fingerprint caches all live under one root with an
//! explicit lifecycle: opened at run start, optionally cleared at run end.
//! Nothing in the engine touches an ambient path.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;

/// Handle to the cache directory.
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// Open (creating if necessary) the cache directory at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    /// The cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the persisted session record.
    pub fn session_file(&self) -> PathBuf {
        self.root.join("session.json")
    }

    /// Path of the persisted metadata describe catalog.
    pub fn catalog_file(&self) -> PathBuf {
        self.root.join("metadata-describe.json")
    }

    /// Fingerprint cache directory for a watched source root.
    ///
    /// Content-addressed by a hash of the resolved absolute root so two
    /// different relative spellings of the same directory share one cache.
    pub fn fingerprint_dir(&self, source_root: &Path) -> Result<PathBuf> {
        let resolved = source_root
            .canonicalize()
            .or_else(|_| std::path::absolute(source_root))?;

        let mut hasher = Sha256::new();
        hasher.update(resolved.as_os_str().as_encoded_bytes());
        let key = hex::encode(hasher.finalize());

        Ok(self.root.join("fingerprints").join(&key[..16]))
    }

    /// Remove the whole cache directory. Called after a run when
    /// `clear_cache` is set, regardless of the run's outcome.
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            debug!(root = %self.root.display(), "clearing cache directory");
            std::fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("cache");
        let cache = CacheDir::open(&root).unwrap();

        assert!(root.is_dir());
        assert_eq!(cache.session_file(), root.join("session.json"));
        assert_eq!(cache.catalog_file(), root.join("metadata-describe.json"));
    }

    #[test]
    fn test_fingerprint_dir_shared_across_spellings() {
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::open(dir.path().join("cache")).unwrap();

        let source = dir.path().join("src");
        std::fs::create_dir_all(&source).unwrap();

        let direct = cache.fingerprint_dir(&source).unwrap();
        let dotted = cache
            .fingerprint_dir(&source.join("sub").join(".."))
            .unwrap();

        assert_eq!(direct, dotted);
    }

    #[test]
    fn test_different_roots_differ() {
        let dir = TempDir::new().unwrap();
        let cache = CacheDir::open(dir.path().join("cache")).unwrap();

        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();

        assert_ne!(
            cache.fingerprint_dir(&a).unwrap(),
            cache.fingerprint_dir(&b).unwrap()
        );
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("cache");
        let cache = CacheDir::open(&root).unwrap();
        std::fs::write(cache.session_file(), "{}").unwrap();

        cache.clear().unwrap();
        assert!(!root.exists());

        // Clearing an already-missing directory is fine.
        cache.clear().unwrap();
    }
}
