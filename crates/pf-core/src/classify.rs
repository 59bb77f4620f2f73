//! Partition the catalog into wildcard and itemized query buckets.

use std::collections::HashMap;

use packforge_soap::MetadataType;
use tracing::debug;

use crate::options::BuilderOptions;

/// Types that must never be wildcard-fetched at API version 44.0, because
/// wildcard listing is unsupported or unreliable for them.
const NO_WILDCARD_44: &[&str] = &[
    "AnalyticSnapshot",
    "BotVersion",
    "CaseSubjectParticle",
    "Dashboard",
    "Document",
    "EmailServicesFunction",
    "EmailTemplate",
    "EmbeddedServiceBranding",
    "EmbeddedServiceConfig",
    "EmbeddedServiceLiveAgent",
    "LetterHead",
    "Report",
    "StandardValueSet",
];

/// Fallback list for versions without an explicit entry.
const NO_WILDCARD_DEFAULT: &[&str] = NO_WILDCARD_44;

/// The no-wildcard exception list for an API version.
pub fn no_wildcard_types(api_version: &str) -> &'static [&'static str] {
    match api_version {
        "44.0" => NO_WILDCARD_44,
        _ => NO_WILDCARD_DEFAULT,
    }
}

/// Synthetic query-type name for a folder-contained type.
///
/// `EmailTemplate` is the one irregular case; every other folder type is
/// its own name with the literal `Folder` suffix.
pub fn synthetic_folder_type(xml_name: &str) -> String {
    if xml_name == "EmailTemplate" {
        "EmailFolder".to_string()
    } else {
        format!("{xml_name}Folder")
    }
}

/// Bidirectional association between synthetic folder-type names and the
/// content types they contain. Built once during classification, read-only
/// afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderMap {
    folder_to_content: HashMap<String, String>,
    content_to_folder: HashMap<String, String>,
}

impl FolderMap {
    /// Record a folder-contained content type; returns its synthetic
    /// folder-type name.
    pub fn insert(&mut self, content_type: &str) -> String {
        let folder_type = synthetic_folder_type(content_type);
        self.folder_to_content
            .insert(folder_type.clone(), content_type.to_string());
        self.content_to_folder
            .insert(content_type.to_string(), folder_type.clone());
        folder_type
    }

    /// The content type listed under this folder-type name, if any.
    pub fn content_type(&self, folder_type: &str) -> Option<&str> {
        self.folder_to_content.get(folder_type).map(String::as_str)
    }

    /// The synthetic folder-type name for this content type, if any.
    pub fn folder_type(&self, content_type: &str) -> Option<&str> {
        self.content_to_folder.get(content_type).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.folder_to_content.is_empty()
    }
}

/// Result of classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Types fetched with a single wildcard member.
    pub wildcard_types: Vec<MetadataType>,
    /// Types queued for itemized list queries, in catalog order followed
    /// by the expanded special entries.
    pub types_to_query: Vec<MetadataType>,
    /// Folder-type associations for the types in `types_to_query`.
    pub folder_map: FolderMap,
}

/// Classify the catalog under the given options.
///
/// A descriptor is selected when (`all` and not explicitly excluded) or
/// explicitly included; inclusion and exclusion match the xml name or the
/// directory name. Selected descriptors are wildcard-fetched only when
/// wildcards are enabled, the type is off the version's no-wildcard list,
/// and the managed-exclusion policy covers it; everything else is
/// itemized.
///
/// `include_special` entries are expanded one level: an entry naming a
/// descriptor with declared child types is replaced by those children.
/// Children are pushed verbatim and never re-expanded, and special entries
/// are always itemized.
pub fn classify(catalog: &[MetadataType], options: &BuilderOptions) -> Classification {
    let no_wildcards = no_wildcard_types(&options.api_version);

    let mut wildcard_types = Vec::new();
    let mut types_to_query = Vec::new();

    for meta in catalog {
        if !is_selected(meta, options) {
            continue;
        }

        let wildcard_ok = options.use_wildcards
            && !no_wildcards.contains(&meta.xml_name.as_str())
            && options
                .exclude_managed
                .covers(&meta.xml_name, meta.directory_name.as_deref());

        if wildcard_ok {
            wildcard_types.push(meta.clone());
        } else {
            types_to_query.push(meta.clone());
        }
    }

    // Expand include_special into a fresh list; one level only.
    let by_name: HashMap<&str, &MetadataType> = catalog
        .iter()
        .map(|meta| (meta.xml_name.as_str(), meta))
        .collect();

    let mut special = Vec::new();
    for name in &options.include_special {
        match by_name.get(name.as_str()) {
            Some(meta) if !meta.child_xml_names.is_empty() => {
                debug!(parent = %name, children = meta.child_xml_names.len(), "expanding special type");
                special.extend(meta.child_xml_names.iter().cloned());
            }
            _ => special.push(name.clone()),
        }
    }
    for name in special {
        types_to_query.push(MetadataType::synthetic(name));
    }

    let mut folder_map = FolderMap::default();
    for meta in &types_to_query {
        if meta.in_folder {
            folder_map.insert(&meta.xml_name);
        }
    }

    Classification {
        wildcard_types,
        types_to_query,
        folder_map,
    }
}

fn is_selected(meta: &MetadataType, options: &BuilderOptions) -> bool {
    let included = options
        .included
        .as_deref()
        .is_some_and(|list| matches_name(list, meta));
    let excluded = options
        .excluded
        .as_deref()
        .is_some_and(|list| matches_name(list, meta));

    (options.all && !excluded) || included
}

fn matches_name(list: &[String], meta: &MetadataType) -> bool {
    list.iter().any(|name| name == &meta.xml_name)
        || meta
            .directory_name
            .as_deref()
            .is_some_and(|dir| list.iter().any(|name| name == dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ManagedExclusion;

    fn descriptor(xml_name: &str, directory_name: &str, in_folder: bool) -> MetadataType {
        MetadataType {
            xml_name: xml_name.to_string(),
            directory_name: Some(directory_name.to_string()),
            in_folder,
            child_xml_names: Vec::new(),
        }
    }

    fn sample_catalog() -> Vec<MetadataType> {
        vec![
            descriptor("ApexClass", "classes", false),
            descriptor("EmailTemplate", "email", true),
            descriptor("Report", "reports", true),
            MetadataType {
                xml_name: "CustomObject".to_string(),
                directory_name: Some("objects".to_string()),
                in_folder: false,
                child_xml_names: vec!["CustomField".to_string(), "ListView".to_string()],
            },
        ]
    }

    #[test]
    fn test_all_selects_everything_itemized_by_default() {
        let options = BuilderOptions {
            all: true,
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);

        assert!(result.wildcard_types.is_empty());
        assert_eq!(result.types_to_query.len(), 4);
    }

    #[test]
    fn test_excluded_matches_directory_name() {
        let options = BuilderOptions {
            all: true,
            excluded: Some(vec!["classes".to_string()]),
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);

        assert!(!result
            .types_to_query
            .iter()
            .any(|m| m.xml_name == "ApexClass"));
    }

    #[test]
    fn test_included_overrides_absence_of_all() {
        let options = BuilderOptions {
            included: Some(vec!["ApexClass".to_string()]),
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);

        assert_eq!(result.types_to_query.len(), 1);
        assert_eq!(result.types_to_query[0].xml_name, "ApexClass");
    }

    #[test]
    fn test_wildcard_requires_managed_exclusion_cover() {
        // Wildcards enabled + blanket managed exclusion: eligible types go
        // to the wildcard bucket, no-wildcard types stay itemized.
        let options = BuilderOptions {
            all: true,
            use_wildcards: true,
            exclude_managed: ManagedExclusion::Flag(true),
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);

        let wildcard_names: Vec<_> = result
            .wildcard_types
            .iter()
            .map(|m| m.xml_name.as_str())
            .collect();
        assert_eq!(wildcard_names, vec!["ApexClass", "CustomObject"]);

        // EmailTemplate and Report are on the no-wildcard list.
        let itemized_names: Vec<_> = result
            .types_to_query
            .iter()
            .map(|m| m.xml_name.as_str())
            .collect();
        assert_eq!(itemized_names, vec!["EmailTemplate", "Report"]);
    }

    #[test]
    fn test_wildcard_without_exclusion_cover_stays_itemized() {
        let options = BuilderOptions {
            all: true,
            use_wildcards: true,
            exclude_managed: ManagedExclusion::Flag(false),
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);
        assert!(result.wildcard_types.is_empty());
    }

    #[test]
    fn test_disjointness() {
        let options = BuilderOptions {
            all: true,
            use_wildcards: true,
            exclude_managed: ManagedExclusion::Flag(true),
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);

        for wildcard in &result.wildcard_types {
            assert!(!result
                .types_to_query
                .iter()
                .any(|m| m.xml_name == wildcard.xml_name));
        }
    }

    #[test]
    fn test_idempotence() {
        let options = BuilderOptions {
            all: true,
            use_wildcards: true,
            include_special: vec!["CustomObject".to_string()],
            exclude_managed: ManagedExclusion::Flag(true),
            ..Default::default()
        };
        let catalog = sample_catalog();

        let first = classify(&catalog, &options);
        let second = classify(&catalog, &options);
        assert_eq!(first, second);
    }

    #[test]
    fn test_special_expands_one_level() {
        let options = BuilderOptions {
            include_special: vec!["CustomObject".to_string()],
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);

        let names: Vec<_> = result
            .types_to_query
            .iter()
            .map(|m| m.xml_name.as_str())
            .collect();
        assert_eq!(names, vec!["CustomField", "ListView"]);
    }

    #[test]
    fn test_special_without_children_is_kept_verbatim() {
        let options = BuilderOptions {
            include_special: vec!["ApexClass".to_string(), "NotInCatalog".to_string()],
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);

        let names: Vec<_> = result
            .types_to_query
            .iter()
            .map(|m| m.xml_name.as_str())
            .collect();
        assert_eq!(names, vec!["ApexClass", "NotInCatalog"]);
    }

    #[test]
    fn test_special_is_never_wildcarded() {
        let options = BuilderOptions {
            use_wildcards: true,
            exclude_managed: ManagedExclusion::Flag(true),
            include_special: vec!["CustomObject".to_string()],
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);

        assert!(result.wildcard_types.is_empty());
        assert_eq!(result.types_to_query.len(), 2);
    }

    #[test]
    fn test_folder_map_round_trip() {
        let options = BuilderOptions {
            all: true,
            ..Default::default()
        };
        let result = classify(&sample_catalog(), &options);

        assert_eq!(
            result.folder_map.content_type("EmailFolder"),
            Some("EmailTemplate")
        );
        assert_eq!(
            result.folder_map.content_type("ReportFolder"),
            Some("Report")
        );
        assert_eq!(
            result.folder_map.folder_type("EmailTemplate"),
            Some("EmailFolder")
        );
        assert_eq!(result.folder_map.content_type("ApexClassFolder"), None);
    }

    #[test]
    fn test_synthetic_folder_type_names() {
        assert_eq!(synthetic_folder_type("EmailTemplate"), "EmailFolder");
        assert_eq!(synthetic_folder_type("Report"), "ReportFolder");
        assert_eq!(synthetic_folder_type("Dashboard"), "DashboardFolder");
    }

    #[test]
    fn test_unknown_version_falls_back() {
        assert_eq!(no_wildcard_types("44.0"), no_wildcard_types("99.0"));
        assert!(no_wildcard_types("99.0").contains(&"EmailTemplate"));
    }
}
