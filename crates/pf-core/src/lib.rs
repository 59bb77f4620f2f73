//! # packforge-core
//!
//! The engine behind packforge: decide *what* to request from the Metadata
//! API, batch it under the API's 3-query cap, resolve two-level folder
//! hierarchies, filter managed components, and render the result as
//! `package.xml`.
//!
//! The pipeline is:
//!
//! 1. [`catalog::CatalogCache`] - the org's type catalog, cached on disk.
//! 2. [`classify::classify`] - partition types into wildcard and itemized
//!    buckets, expand special parent types, map folder-contained types.
//! 3. [`query::QueryScheduler`] - run the batched list queries (two rounds
//!    for folder types) through the session layer.
//! 4. [`filter::include_item`] - managed-component policy.
//! 5. [`manifest::PackageManifest`] - render the document.
//!
//! The alternate entry is [`diff::DiffEngine`]: fingerprint the local
//! source tree, compare against the previous run, and feed only the
//! changed components into the same filter and serializer.

pub mod builder;
pub mod cache;
pub mod catalog;
pub mod classify;
pub mod diff;
mod error;
pub mod filter;
pub mod manifest;
pub mod options;
pub mod query;

pub use builder::{Action, Outcome, PackageBuilder};
pub use cache::CacheDir;
pub use catalog::{CatalogCache, StoredCatalog};
pub use classify::{classify, Classification, FolderMap};
pub use diff::{ChangeEntry, DiffEngine};
pub use error::{Error, ErrorKind, Result};
pub use manifest::{PackageManifest, PackageTypeMembers};
pub use options::{BuilderOptions, LoginSource, ManagedExclusion};
pub use query::{ItemizedTypes, QueryPlan, QueryScheduler};
