//! Run orchestration: build, diff and commit actions.

use std::collections::HashMap;
use std::path::PathBuf;

use packforge_session::{FileSessionStore, SessionManager};
use packforge_soap::MetadataItem;
use tracing::{debug, info, warn};

use crate::cache::CacheDir;
use crate::catalog::CatalogCache;
use crate::classify::classify;
use crate::diff::DiffEngine;
use crate::error::{Error, ErrorKind, Result};
use crate::filter;
use crate::manifest::PackageManifest;
use crate::options::BuilderOptions;
use crate::query::{ItemizedTypes, QueryScheduler};

/// What a run should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Build a manifest; takes the diff path when `source_dir` is set.
    Build,
    /// Build a manifest from local changes only; requires `source_dir`.
    Diff,
    /// Commit the pending fingerprints from the last diff.
    Commit,
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A manifest was written to the given path.
    Written(PathBuf),
    /// The diff found no changes; nothing was written.
    NothingToDo,
    /// Pending fingerprints were committed.
    Committed(usize),
}

/// Owns one run: options, cache directory, session manager.
#[derive(Debug)]
pub struct PackageBuilder {
    options: BuilderOptions,
    cache: CacheDir,
    manager: SessionManager,
}

impl PackageBuilder {
    /// Create a builder, validating the configuration up front.
    ///
    /// Selecting nothing is a configuration error caught here, before any
    /// remote call: with `all` unset and `included` empty, only
    /// `include_special` can justify a non-diff build.
    pub fn new(options: BuilderOptions) -> Result<Self> {
        let nothing_included =
            !options.all && !options.included.as_deref().is_some_and(|list| !list.is_empty());
        let nothing_special = options.include_special.is_empty();
        if nothing_included && (options.is_diff() || nothing_special) {
            return Err(Error::new(ErrorKind::NoSelection));
        }

        let credentials = options.credentials()?;
        let cache = CacheDir::open(&options.cache_dir)?;
        let manager = SessionManager::new(
            credentials,
            options.api_version.clone(),
            FileSessionStore::at(cache.session_file()),
        );

        Ok(Self {
            options,
            cache,
            manager,
        })
    }

    /// Run one action. When `clear_cache` is set the cache directory is
    /// wiped afterwards, whatever the outcome.
    pub async fn run(&self, action: Action) -> Result<Outcome> {
        let result = match action {
            Action::Build if self.options.is_diff() => self.build_diff().await,
            Action::Build => self.build_full().await,
            Action::Diff => self.build_diff().await,
            Action::Commit => self.commit(),
        };

        if self.options.clear_cache {
            if let Err(err) = self.cache.clear() {
                warn!(%err, "failed to clear cache directory");
            }
        }

        result
    }

    /// Full pipeline: catalog, classify, query, filter, serialize.
    async fn build_full(&self) -> Result<Outcome> {
        let catalog = CatalogCache::at(self.cache.catalog_file())
            .get(&self.manager, &self.options.api_version)
            .await?;

        let classification = classify(&catalog.metadata_objects, &self.options);
        debug!(
            wildcard = classification.wildcard_types.len(),
            itemized = classification.types_to_query.len(),
            "catalog classified"
        );

        let scheduler = QueryScheduler::new(&self.manager, &self.options.api_version);
        let itemized = scheduler
            .run(
                &classification.types_to_query,
                &classification.folder_map,
                &self.options,
            )
            .await?;

        let manifest = PackageManifest::from_buckets(
            &classification.wildcard_types,
            &itemized,
            &self.options.api_version,
        );
        manifest.write_to(&self.options.dest)?;
        info!(dest = %self.options.dest.display(), "manifest written");

        Ok(Outcome::Written(self.options.dest.clone()))
    }

    /// Diff pipeline: fingerprint the source tree, derive changed
    /// components, serialize only those.
    async fn build_diff(&self) -> Result<Outcome> {
        let engine = self.diff_engine()?;

        // The catalog still drives which directories are watched and how a
        // directory maps back to a type name.
        let catalog = CatalogCache::at(self.cache.catalog_file())
            .get(&self.manager, &self.options.api_version)
            .await?;

        let watched: Vec<String> = catalog
            .metadata_objects
            .iter()
            .filter_map(|meta| meta.directory_name.clone())
            .collect();

        let changes = engine.compute_changes(&watched)?;
        if changes.is_empty() {
            info!("no local changes detected");
            return Ok(Outcome::NothingToDo);
        }

        let dir_to_xml: HashMap<&str, &str> = catalog
            .metadata_objects
            .iter()
            .filter_map(|meta| {
                meta.directory_name
                    .as_deref()
                    .map(|dir| (dir, meta.xml_name.as_str()))
            })
            .collect();

        let mut itemized = ItemizedTypes::default();
        for change in &changes {
            let Some(xml_name) = dir_to_xml.get(change.directory_name.as_str()) else {
                warn!(directory = %change.directory_name, "no metadata type for directory");
                continue;
            };

            itemized.init_type(xml_name);
            let item = MetadataItem {
                full_name: change.member_name.clone(),
                item_type: (*xml_name).to_string(),
                manageable_state: Some("unmanaged".to_string()),
                folder: (!change.folder.is_empty()).then(|| change.folder.clone()),
            };
            if filter::include_item(&item, &self.options) {
                itemized.push(item);
            }
        }

        let manifest =
            PackageManifest::from_buckets(&[], &itemized, &self.options.api_version);
        manifest.write_to(&self.options.dest)?;
        info!(
            dest = %self.options.dest.display(),
            components = changes.len(),
            "diff manifest written"
        );

        Ok(Outcome::Written(self.options.dest.clone()))
    }

    /// Commit the pending change log into the fingerprint cache.
    fn commit(&self) -> Result<Outcome> {
        let engine = self.diff_engine()?;
        let committed = engine.commit()?;
        info!(fingerprints = committed, "diff committed");
        Ok(Outcome::Committed(committed))
    }

    fn diff_engine(&self) -> Result<DiffEngine> {
        let source_root = self.options.source_dir.clone().ok_or_else(|| {
            Error::new(ErrorKind::Config(
                "source_dir is required for diff and commit actions".to_string(),
            ))
        })?;
        let fingerprint_dir = self.cache.fingerprint_dir(&source_root)?;
        Ok(DiffEngine::new(
            source_root,
            fingerprint_dir,
            self.options.diff_log.clone(),
        ))
    }
}
