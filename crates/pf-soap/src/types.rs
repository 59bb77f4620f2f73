//! Wire types shared by the describe and list operations.

use serde::{Deserialize, Serialize};

/// SOAP fault returned by a Salesforce endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoapFault {
    pub fault_code: String,
    pub fault_string: String,
}

impl std::fmt::Display for SoapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SOAP Fault: {} - {}", self.fault_code, self.fault_string)
    }
}

impl std::error::Error for SoapFault {}

/// One metadata type descriptor from `describeMetadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataType {
    pub xml_name: String,
    pub directory_name: Option<String>,
    pub in_folder: bool,
    pub child_xml_names: Vec<String>,
}

impl MetadataType {
    /// Descriptor for a type name that never came from a describe call,
    /// e.g. an expanded child type requested via `include_special`.
    pub fn synthetic(xml_name: impl Into<String>) -> Self {
        Self {
            xml_name: xml_name.into(),
            directory_name: None,
            in_folder: false,
            child_xml_names: Vec::new(),
        }
    }
}

/// Result of `describeMetadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeResult {
    pub organization_namespace: Option<String>,
    pub metadata_objects: Vec<MetadataType>,
}

/// One `listMetadata` query entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub metadata_type: String,
    pub folder: Option<String>,
}

impl ListQuery {
    pub fn of_type(metadata_type: impl Into<String>) -> Self {
        Self {
            metadata_type: metadata_type.into(),
            folder: None,
        }
    }

    pub fn in_folder(metadata_type: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            metadata_type: metadata_type.into(),
            folder: Some(folder.into()),
        }
    }
}

/// One component instance from a `listMetadata` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub full_name: String,
    pub item_type: String,
    pub manageable_state: Option<String>,
    pub folder: Option<String>,
}
