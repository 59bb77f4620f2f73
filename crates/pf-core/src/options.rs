//! The configuration surface consumed by the builder.

use std::path::{Path, PathBuf};

use packforge_session::LoginCredentials;
use serde::Deserialize;

use crate::error::{Error, ErrorKind, Result};

/// Options controlling a manifest build.
///
/// Deserialized from a JSON configuration file; every field has a default
/// so a config only states what it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Request every metadata type the org describes.
    pub all: bool,
    /// Use wildcard members where the type supports them.
    pub use_wildcards: bool,
    /// Explicitly included type names (xml or directory names).
    pub included: Option<Vec<String>>,
    /// Explicitly excluded type names (xml or directory names); only
    /// meaningful together with `all`.
    pub excluded: Option<Vec<String>>,
    /// Types to itemize even when not selected, with one level of
    /// parent-to-child expansion (e.g. `CustomObject` -> `CustomField`...).
    pub include_special: Vec<String>,
    /// Managed-component exclusion policy: `true`, `false`, or a list of
    /// type names.
    pub exclude_managed: ManagedExclusion,
    /// Types kept even when `exclude_managed` is `true`.
    pub include_managed: Vec<String>,
    /// Metadata API version.
    pub api_version: String,
    /// Watched source root; setting it selects the incremental diff path.
    pub source_dir: Option<PathBuf>,
    /// Where the manifest is written.
    pub dest: PathBuf,
    /// Where the pending change log is written between diff and commit.
    pub diff_log: PathBuf,
    /// Wipe the cache directory after the run, success or failure.
    pub clear_cache: bool,
    /// Cache directory for session, catalog and fingerprint files.
    pub cache_dir: PathBuf,
    /// Login credentials, inline or as a path to a JSON credential file.
    pub login: Option<LoginSource>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            all: false,
            use_wildcards: false,
            included: None,
            excluded: None,
            include_special: Vec::new(),
            exclude_managed: ManagedExclusion::default(),
            include_managed: Vec::new(),
            api_version: "44.0".to_string(),
            source_dir: None,
            dest: PathBuf::from("package.xml"),
            diff_log: PathBuf::from("./diff.log"),
            clear_cache: false,
            cache_dir: PathBuf::from(".packforge"),
            login: None,
        }
    }
}

impl BuilderOptions {
    /// Load options from a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            Error::with_source(
                ErrorKind::Config(format!(
                    "unable to read configuration file {}",
                    path.as_ref().display()
                )),
                err,
            )
        })?;
        serde_json::from_str(&text).map_err(|err| {
            Error::with_source(
                ErrorKind::Config(format!(
                    "configuration file {} is not valid",
                    path.as_ref().display()
                )),
                err,
            )
        })
    }

    /// Whether this run takes the incremental diff path.
    pub fn is_diff(&self) -> bool {
        self.source_dir.is_some()
    }

    /// Resolve the configured credentials.
    pub fn credentials(&self) -> Result<LoginCredentials> {
        let source = self
            .login
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::Config("login credentials missing".to_string())))?;
        source.resolve()
    }
}

/// The managed-exclusion policy: a blanket flag or a set of type names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ManagedExclusion {
    /// `true` excludes every managed component, `false` none.
    Flag(bool),
    /// Exclude managed components of exactly these types (xml or directory
    /// names).
    Types(Vec<String>),
}

impl Default for ManagedExclusion {
    fn default() -> Self {
        ManagedExclusion::Flag(false)
    }
}

impl ManagedExclusion {
    /// True when the policy is the blanket `true` flag.
    pub fn excludes_all(&self) -> bool {
        matches!(self, ManagedExclusion::Flag(true))
    }

    /// True when the policy names this exact type.
    pub fn names_type(&self, type_name: &str) -> bool {
        matches!(self, ManagedExclusion::Types(types) if types.iter().any(|t| t == type_name))
    }

    /// True when the policy applies to a descriptor with this xml name and
    /// directory name. Used for wildcard eligibility during classification.
    pub fn covers(&self, xml_name: &str, directory_name: Option<&str>) -> bool {
        match self {
            ManagedExclusion::Flag(flag) => *flag,
            ManagedExclusion::Types(types) => {
                types.iter().any(|t| t == xml_name)
                    || directory_name.is_some_and(|dir| types.iter().any(|t| t == dir))
            }
        }
    }
}

/// Where login credentials come from: inline in the config, or a separate
/// JSON file kept out of version control.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LoginSource {
    /// Path to a JSON credential file.
    Path(PathBuf),
    /// Credentials inline in the configuration.
    Inline(LoginCredentials),
}

impl LoginSource {
    /// Resolve to concrete credentials.
    pub fn resolve(&self) -> Result<LoginCredentials> {
        match self {
            LoginSource::Path(path) => LoginCredentials::from_file(path).map_err(|err| {
                Error::with_source(ErrorKind::Config("unable to load login".to_string()), err)
            }),
            LoginSource::Inline(creds) => {
                creds.validate().map_err(|err| {
                    Error::with_source(ErrorKind::Config("invalid login".to_string()), err)
                })?;
                Ok(creds.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options: BuilderOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.all);
        assert_eq!(options.api_version, "44.0");
        assert_eq!(options.dest, PathBuf::from("package.xml"));
        assert_eq!(options.exclude_managed, ManagedExclusion::Flag(false));
        assert!(!options.is_diff());
    }

    #[test]
    fn test_exclude_managed_flag_or_list() {
        let options: BuilderOptions =
            serde_json::from_str(r#"{"exclude_managed": true}"#).unwrap();
        assert!(options.exclude_managed.excludes_all());

        let options: BuilderOptions =
            serde_json::from_str(r#"{"exclude_managed": ["CustomField"]}"#).unwrap();
        assert!(!options.exclude_managed.excludes_all());
        assert!(options.exclude_managed.names_type("CustomField"));
        assert!(!options.exclude_managed.names_type("ApexClass"));
    }

    #[test]
    fn test_covers_matches_directory_name() {
        let policy = ManagedExclusion::Types(vec!["objects".to_string()]);
        assert!(policy.covers("CustomObject", Some("objects")));
        assert!(!policy.covers("CustomObject", Some("classes")));
        assert!(ManagedExclusion::Flag(true).covers("Anything", None));
    }

    #[test]
    fn test_login_source_inline() {
        let options: BuilderOptions = serde_json::from_str(
            r#"{"login": {"username": "u@x.com", "password": "p"}}"#,
        )
        .unwrap();
        let creds = options.credentials().unwrap();
        assert_eq!(creds.username, "u@x.com");
    }

    #[test]
    fn test_login_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(&path, r#"{"username": "u@x.com", "password": "p", "token": "T"}"#)
            .unwrap();

        let json = format!(r#"{{"login": {:?}}}"#, path.to_str().unwrap());
        let options: BuilderOptions = serde_json::from_str(&json).unwrap();
        let creds = options.credentials().unwrap();
        assert_eq!(creds.security_token, "T");
    }

    #[test]
    fn test_missing_login_is_config_error() {
        let options = BuilderOptions::default();
        let err = options.credentials().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }
}
