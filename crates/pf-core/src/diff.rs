//! Incremental content diffing of a local source tree.
//!
//! Fingerprints every file under the watched directories (content hash,
//! never mtime), compares against the previous run's persisted
//! fingerprints, and derives the changed logical components. New
//! fingerprints only reach the persisted cache through the explicit
//! [`DiffEngine::commit`] step, so repeated runs against an uncommitted
//! state reproduce the same change set.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, ErrorKind, Result};

/// Trailing marker on companion descriptor files, stripped before a
/// component name is derived.
pub const META_SUFFIX: &str = "-meta.xml";

/// Top-level directory holding bundle-style components: the component is
/// the immediate subdirectory, whatever file inside it changed.
const BUNDLE_DIR: &str = "aura";

/// Top-level directories whose members live in named folders.
const FOLDER_DIRS: &[&str] = &["documents", "email", "reports", "dashboards"];

/// One changed logical component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    /// Top-level metadata directory the file lives under.
    pub directory_name: String,
    /// Qualified member name (folder nesting preserved where applicable).
    pub member_name: String,
    /// Folder portion of the member name, empty for unfoldered types.
    pub folder: String,
    /// Content hash of the changed file.
    pub content_hash: String,
}

/// One pending fingerprint in the change log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogRecord {
    pub hash: String,
    pub relative_path: String,
}

/// The diff engine for one source root.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    source_root: PathBuf,
    fingerprint_dir: PathBuf,
    log_path: PathBuf,
}

impl DiffEngine {
    /// Create an engine over `source_root`, with fingerprints cached under
    /// `fingerprint_dir` and the pending change log at `log_path`.
    pub fn new(
        source_root: impl Into<PathBuf>,
        fingerprint_dir: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            fingerprint_dir: fingerprint_dir.into(),
            log_path: log_path.into(),
        }
    }

    /// Fingerprint the watched directories and derive the change set.
    ///
    /// Writes the change log for a later [`commit`]; the persisted
    /// fingerprint cache itself is untouched. An empty result means
    /// nothing changed - a valid outcome, never an error.
    ///
    /// [`commit`]: DiffEngine::commit
    pub fn compute_changes(&self, watched_directories: &[String]) -> Result<Vec<ChangeEntry>> {
        let mut changes = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut log: BTreeMap<String, ChangeLogRecord> = BTreeMap::new();

        for dir in watched_directories {
            let dir_path = self.source_root.join(dir);
            if !dir_path.is_dir() {
                continue;
            }

            for entry in WalkDir::new(&dir_path).sort_by_file_name() {
                let entry = entry.map_err(|err| {
                    Error::new(ErrorKind::Io(format!(
                        "walking {}: {err}",
                        dir_path.display()
                    )))
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }

                let relative = entry
                    .path()
                    .strip_prefix(&self.source_root)
                    .expect("walked file is under the source root")
                    .to_path_buf();

                let hash = hash_file(entry.path())?;
                let cache_file = self.fingerprint_dir.join(&relative);

                if self.previous_hash(&cache_file).as_deref() == Some(hash.as_str()) {
                    continue;
                }

                log.insert(
                    cache_file.to_string_lossy().into_owned(),
                    ChangeLogRecord {
                        hash: hash.clone(),
                        relative_path: relative.to_string_lossy().into_owned(),
                    },
                );

                let Some(change) = component_for_path(&relative, hash) else {
                    warn!(path = %relative.display(), "changed file maps to no component");
                    continue;
                };
                let key = (change.directory_name.clone(), change.member_name.clone());
                if seen.insert(key) {
                    changes.push(change);
                }
            }
        }

        debug!(
            changed_files = log.len(),
            components = changes.len(),
            "diff computed"
        );
        self.write_change_log(&log)?;

        Ok(changes)
    }

    /// Commit the pending change log: move every logged hash into the
    /// fingerprint cache, then delete the log. Returns the number of
    /// fingerprints written. With no pending log this is a no-op.
    pub fn commit(&self) -> Result<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let json = std::fs::read_to_string(&self.log_path)?;
        let log: BTreeMap<String, ChangeLogRecord> = serde_json::from_str(&json)
            .map_err(|err| {
                Error::with_source(
                    ErrorKind::Cache(format!(
                        "change log {} is not valid",
                        self.log_path.display()
                    )),
                    err,
                )
            })?;

        for (cache_file, record) in &log {
            let path = Path::new(cache_file);
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &record.hash)?;
        }

        std::fs::remove_file(&self.log_path)?;
        debug!(fingerprints = log.len(), "change log committed");

        Ok(log.len())
    }

    fn previous_hash(&self, cache_file: &Path) -> Option<String> {
        std::fs::read_to_string(cache_file)
            .ok()
            .map(|s| s.trim().to_string())
    }

    fn write_change_log(&self, log: &BTreeMap<String, ChangeLogRecord>) -> Result<()> {
        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(log)?;
        std::fs::write(&self.log_path, json)?;
        Ok(())
    }
}

/// Content hash of one file.
fn hash_file(path: &Path) -> Result<String> {
    let contents = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode(hasher.finalize()))
}

/// Map a changed file path (relative to the source root) to its logical
/// component.
///
/// Rules, by the path's top-level directory:
/// - `aura`: bundle-style - the member is the immediate subdirectory.
/// - `documents`, `email`, `reports`, `dashboards`: folder-bearing - the
///   member is the nested path with the descriptor suffix and the file
///   extension stripped; the folder is everything before the last
///   separator.
/// - anything else: the member is the file's base name up to its first
///   period.
pub fn component_for_path(relative: &Path, content_hash: String) -> Option<ChangeEntry> {
    let mut components = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned());
    let directory_name = components.next()?;
    let rest: Vec<String> = components.collect();
    if rest.is_empty() {
        // A file sitting directly in the source root's type directory
        // level, e.g. `classes` itself; nothing to derive.
        return None;
    }

    if directory_name == BUNDLE_DIR && rest.len() >= 2 {
        return Some(ChangeEntry {
            directory_name,
            member_name: rest[0].clone(),
            folder: String::new(),
            content_hash,
        });
    }

    if FOLDER_DIRS.contains(&directory_name.as_str()) {
        let nested = rest.join("/");
        let stripped = strip_descriptor_suffix(&nested);
        let member_name = strip_extension(stripped);
        let folder = member_name
            .rfind('/')
            .map(|idx| member_name[..idx].to_string())
            .unwrap_or_default();

        return Some(ChangeEntry {
            directory_name,
            member_name,
            folder,
            content_hash,
        });
    }

    let base = rest.last().expect("rest is non-empty");
    let base = strip_descriptor_suffix(base);
    let member_name = base
        .split('.')
        .next()
        .unwrap_or(base)
        .to_string();

    Some(ChangeEntry {
        directory_name,
        member_name,
        folder: String::new(),
        content_hash,
    })
}

fn strip_descriptor_suffix(name: &str) -> &str {
    name.strip_suffix(META_SUFFIX).unwrap_or(name)
}

/// Drop the extension of the final path segment, keeping any folder
/// nesting in front of it.
fn strip_extension(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => {
            let (folders, base) = path.split_at(idx + 1);
            let base = base.split('.').next().unwrap_or(base);
            format!("{folders}{base}")
        }
        None => path.split('.').next().unwrap_or(path).to_string(),
    }
}
