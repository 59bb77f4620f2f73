//! # packforge
//!
//! Salesforce `package.xml` manifest builder.
//!
//! packforge queries the Metadata API describe/list operations, classifies
//! component types into wildcard and itemized buckets, batches list
//! queries under the API's 3-query cap, resolves folder-contained types in
//! a second query round, filters managed components, and renders the
//! result as `package.xml`. An incremental mode fingerprints a local
//! source tree and builds a manifest from just what changed since the last
//! committed run.
//!
//! ## Crates
//!
//! - **packforge-soap** - SOAP transport: Partner login, describe and list
//! - **packforge-session** - Session caching and retry-with-refresh
//! - **packforge-core** - Classification, query scheduling, diffing,
//!   manifest rendering
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use packforge_core::{Action, BuilderOptions, PackageBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), packforge_core::Error> {
//!     let options = BuilderOptions::from_file("packforge.json")?;
//!     let builder = PackageBuilder::new(options)?;
//!     builder.run(Action::Build).await?;
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
pub use packforge_core as core;
pub use packforge_session as session;
pub use packforge_soap as soap;
