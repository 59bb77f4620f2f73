//! Metadata API client: `describeMetadata` and `listMetadata`.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::partner::parse_soap_fault;
use crate::types::{DescribeResult, ListQuery, MetadataItem, MetadataType};
use crate::xml;

/// SOAP Action header name.
static SOAP_ACTION_HEADER: HeaderName = HeaderName::from_static("soapaction");

/// Hard cap the Metadata API places on queries per `listMetadata` call.
pub const MAX_LIST_QUERIES: usize = 3;

/// Salesforce Metadata API client bound to one session.
#[derive(Debug)]
pub struct MetadataClient {
    metadata_url: String,
    session_id: String,
    http_client: reqwest::Client,
}

impl MetadataClient {
    /// Create a client from the metadata endpoint URL and a session id,
    /// both of which come from a Partner `login` result.
    pub fn from_parts(metadata_url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            metadata_url: metadata_url.into(),
            session_id: session_id.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Set a custom HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    /// Build common headers for SOAP requests.
    fn build_headers(&self, soap_action: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/xml;charset=UTF-8"),
        );
        headers.insert(
            SOAP_ACTION_HEADER.clone(),
            HeaderValue::from_str(soap_action).unwrap(),
        );
        headers
    }

    /// Describe all metadata types available at the given API version.
    pub async fn describe_metadata(&self, api_version: &str) -> Result<DescribeResult> {
        debug!(api_version, "describeMetadata");

        let envelope = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:tns="http://soap.sforce.com/2006/04/metadata">
  <soapenv:Header>
    <tns:SessionHeader>
      <tns:sessionId>{session_id}</tns:sessionId>
    </tns:SessionHeader>
  </soapenv:Header>
  <soapenv:Body>
    <tns:describeMetadata>
      <asOfVersion>{api_version}</asOfVersion>
    </tns:describeMetadata>
  </soapenv:Body>
</soapenv:Envelope>"#,
            session_id = self.session_id,
            api_version = xml::escape(api_version),
        );

        let response = self
            .http_client
            .post(&self.metadata_url)
            .headers(self.build_headers("describeMetadata"))
            .body(envelope)
            .send()
            .await?;

        let response_text = response.text().await?;

        if let Some(fault) = parse_soap_fault(&response_text) {
            return Err(Error::new(ErrorKind::SoapFault(fault)));
        }

        Ok(parse_describe_result(&response_text))
    }

    /// List metadata components for up to [`MAX_LIST_QUERIES`] queries.
    pub async fn list_metadata(
        &self,
        queries: &[ListQuery],
        api_version: &str,
    ) -> Result<Vec<MetadataItem>> {
        if queries.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "listMetadata requires at least one query".to_string(),
            )));
        }
        if queries.len() > MAX_LIST_QUERIES {
            return Err(Error::new(ErrorKind::TooManyQueries {
                count: queries.len(),
                limit: MAX_LIST_QUERIES,
            }));
        }

        debug!(count = queries.len(), api_version, "listMetadata");

        let queries_xml: String = queries
            .iter()
            .map(|q| {
                let folder_xml = q
                    .folder
                    .as_deref()
                    .map(|f| format!("\n        <folder>{}</folder>", xml::escape(f)))
                    .unwrap_or_default();
                format!(
                    "      <queries>\n        <type>{}</type>{}\n      </queries>",
                    xml::escape(&q.metadata_type),
                    folder_xml
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let envelope = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:tns="http://soap.sforce.com/2006/04/metadata">
  <soapenv:Header>
    <tns:SessionHeader>
      <tns:sessionId>{session_id}</tns:sessionId>
    </tns:SessionHeader>
  </soapenv:Header>
  <soapenv:Body>
    <tns:listMetadata>
{queries}
      <asOfVersion>{api_version}</asOfVersion>
    </tns:listMetadata>
  </soapenv:Body>
</soapenv:Envelope>"#,
            session_id = self.session_id,
            queries = queries_xml,
            api_version = xml::escape(api_version),
        );

        let response = self
            .http_client
            .post(&self.metadata_url)
            .headers(self.build_headers("listMetadata"))
            .body(envelope)
            .send()
            .await?;

        let response_text = response.text().await?;

        if let Some(fault) = parse_soap_fault(&response_text) {
            return Err(Error::new(ErrorKind::SoapFault(fault)));
        }

        Ok(parse_list_result(&response_text))
    }
}

/// Parse a `describeMetadata` response body.
fn parse_describe_result(xml_text: &str) -> DescribeResult {
    let organization_namespace = xml::extract_element(xml_text, "organizationNamespace")
        .filter(|ns| !ns.is_empty());

    let metadata_objects = xml::extract_blocks(xml_text, "metadataObjects")
        .into_iter()
        .filter_map(|block| {
            let xml_name = xml::extract_element(block, "xmlName")?;
            Some(MetadataType {
                xml_name,
                directory_name: xml::extract_element(block, "directoryName"),
                in_folder: xml::extract_element(block, "inFolder")
                    .map(|s| s == "true")
                    .unwrap_or(false),
                child_xml_names: xml::extract_elements(block, "childXmlNames"),
            })
        })
        .collect();

    DescribeResult {
        organization_namespace,
        metadata_objects,
    }
}

/// Parse a `listMetadata` response body.
///
/// A query that matches nothing simply contributes no `<result>` elements;
/// an empty vec is a valid outcome, not an error.
fn parse_list_result(xml_text: &str) -> Vec<MetadataItem> {
    xml::extract_blocks(xml_text, "result")
        .into_iter()
        .filter_map(|block| {
            let full_name = xml::extract_element(block, "fullName")?;
            let item_type = xml::extract_element(block, "type")?;
            Some(MetadataItem {
                full_name,
                item_type,
                manageable_state: xml::extract_element(block, "manageableState"),
                folder: None,
            })
        })
        .collect()
}
