//! package.xml rendering.

use std::path::Path;

use packforge_soap::{xml, MetadataType};

use crate::error::Result;
use crate::query::ItemizedTypes;

/// Namespace of the package manifest document.
pub const METADATA_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";

/// Package manifest (package.xml).
///
/// All values are XML-escaped when rendered, so member names coming from
/// the org or from local file paths cannot break the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub types: Vec<PackageTypeMembers>,
    pub version: String,
}

/// Type members in a package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTypeMembers {
    pub name: String,
    pub members: Vec<String>,
}

impl PackageManifest {
    /// Create a new package manifest with the given API version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            types: Vec::new(),
            version: version.into(),
        }
    }

    /// Add a metadata type with its members.
    pub fn add_type(mut self, name: impl Into<String>, members: Vec<String>) -> Self {
        self.types.push(PackageTypeMembers {
            name: name.into(),
            members,
        });
        self
    }

    /// Build a manifest from the classification buckets: one group per
    /// non-empty itemized type (members in discovery order), then one
    /// wildcard group per wildcard type.
    pub fn from_buckets(
        wildcard_types: &[MetadataType],
        itemized: &ItemizedTypes,
        version: &str,
    ) -> Self {
        let mut manifest = Self::new(version);

        for (type_name, items) in itemized.iter() {
            if items.is_empty() {
                continue;
            }
            manifest.types.push(PackageTypeMembers {
                name: type_name.to_string(),
                members: items.iter().map(|item| item.full_name.clone()).collect(),
            });
        }

        for wildcard in wildcard_types {
            manifest.types.push(PackageTypeMembers {
                name: wildcard.xml_name.clone(),
                members: vec!["*".to_string()],
            });
        }

        manifest
    }

    /// Render the complete document.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!("<Package xmlns=\"{METADATA_NAMESPACE}\">\n"));

        for type_members in &self.types {
            out.push_str("  <types>\n");
            for member in &type_members.members {
                out.push_str(&format!(
                    "    <members>{}</members>\n",
                    xml::escape(member)
                ));
            }
            out.push_str(&format!(
                "    <name>{}</name>\n",
                xml::escape(&type_members.name)
            ));
            out.push_str("  </types>\n");
        }

        out.push_str(&format!(
            "  <version>{}</version>\n",
            xml::escape(&self.version)
        ));
        out.push_str("</Package>\n");
        out
    }

    /// Write the document to a file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path.as_ref(), self.to_xml())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packforge_soap::MetadataItem;

    fn item(item_type: &str, full_name: &str) -> MetadataItem {
        MetadataItem {
            full_name: full_name.to_string(),
            item_type: item_type.to_string(),
            manageable_state: Some("unmanaged".to_string()),
            folder: None,
        }
    }

    #[test]
    fn test_to_xml_structure() {
        let manifest = PackageManifest::new("44.0")
            .add_type("ApexClass", vec!["Foo".to_string(), "Bar".to_string()])
            .add_type("ApexTrigger", vec!["*".to_string()]);

        let xml_text = manifest.to_xml();

        assert!(xml_text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml_text.contains("<Package xmlns=\"http://soap.sforce.com/2006/04/metadata\">"));
        assert!(xml_text.contains("<members>Foo</members>"));
        assert!(xml_text.contains("<members>Bar</members>"));
        assert!(xml_text.contains("<name>ApexClass</name>"));
        assert!(xml_text.contains("<members>*</members>"));
        assert!(xml_text.ends_with("</Package>\n"));

        // Members precede the type name, version trails all groups.
        let foo = xml_text.find("<members>Foo</members>").unwrap();
        let name = xml_text.find("<name>ApexClass</name>").unwrap();
        let version = xml_text.find("<version>44.0</version>").unwrap();
        assert!(foo < name);
        assert!(name < version);
    }

    #[test]
    fn test_from_buckets_skips_empty_and_orders_wildcards_last() {
        let mut itemized = ItemizedTypes::default();
        itemized.init_type("ApexClass");
        itemized.init_type("ApexPage");
        itemized.push(item("ApexClass", "Foo"));

        let wildcards = vec![MetadataType {
            xml_name: "CustomObject".to_string(),
            directory_name: Some("objects".to_string()),
            in_folder: false,
            child_xml_names: Vec::new(),
        }];

        let manifest = PackageManifest::from_buckets(&wildcards, &itemized, "44.0");

        assert_eq!(manifest.types.len(), 2);
        assert_eq!(manifest.types[0].name, "ApexClass");
        assert_eq!(manifest.types[0].members, vec!["Foo"]);
        assert_eq!(manifest.types[1].name, "CustomObject");
        assert_eq!(manifest.types[1].members, vec!["*"]);

        // ApexPage was requested but empty: no group at all.
        assert!(!manifest.to_xml().contains("ApexPage"));
    }

    #[test]
    fn test_escapes_member_names() {
        let manifest = PackageManifest::new("44.0")
            .add_type("Report", vec!["Q&A/<Weekly>".to_string()]);

        let xml_text = manifest.to_xml();
        assert!(xml_text.contains("<members>Q&amp;A/&lt;Weekly&gt;</members>"));
        assert!(!xml_text.contains("<Weekly>"));
    }

    #[test]
    fn test_write_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out").join("package.xml");

        PackageManifest::new("44.0")
            .add_type("ApexClass", vec!["Foo".to_string()])
            .write_to(&dest)
            .unwrap();

        let written = std::fs::read_to_string(&dest).unwrap();
        assert!(written.contains("<name>ApexClass</name>"));
    }
}
