//! Partner API client: the `login` call.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::xml;

/// SOAP Action header name.
static SOAP_ACTION_HEADER: HeaderName = HeaderName::from_static("soapaction");

/// Client name sent in the CallOptions SOAP header.
pub const CLIENT_NAME: &str = "packforge";

/// Result of a successful Partner `login` call.
///
/// `session_id` is a live credential; Debug output redacts it.
#[derive(Clone)]
pub struct LoginResult {
    pub session_id: String,
    pub server_url: String,
    pub metadata_url: String,
}

impl std::fmt::Debug for LoginResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResult")
            .field("session_id", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .field("metadata_url", &self.metadata_url)
            .finish()
    }
}

/// Salesforce Partner API client.
#[derive(Debug, Clone)]
pub struct PartnerClient {
    login_url: String,
    api_version: String,
    http_client: reqwest::Client,
}

impl PartnerClient {
    /// Create a new Partner API client against a login endpoint
    /// (e.g. `https://login.salesforce.com` or a My Domain URL).
    pub fn new(login_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            api_version: api_version.into(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Set a custom HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    /// Get the Partner API SOAP endpoint URL.
    fn partner_url(&self) -> String {
        format!(
            "{}/services/Soap/u/{}",
            self.login_url.trim_end_matches('/'),
            self.api_version
        )
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

    /// Authenticate and obtain a session id plus the Metadata API endpoint.
    ///
    /// `secret` is the password with the security token appended, which is
    /// how the Partner API expects it. Neither value is logged.
    pub async fn login(&self, username: &str, secret: &str) -> Result<LoginResult> {
        debug!(endpoint = %self.partner_url(), "Partner login");

        let envelope = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:urn="urn:partner.soap.sforce.com">
  <soapenv:Header>
    <urn:CallOptions>
      <urn:client>{client}</urn:client>
    </urn:CallOptions>
  </soapenv:Header>
  <soapenv:Body>
    <urn:login>
      <urn:username>{username}</urn:username>
      <urn:password>{password}</urn:password>
    </urn:login>
  </soapenv:Body>
</soapenv:Envelope>"#,
            client = CLIENT_NAME,
            username = xml::escape(username),
            password = xml::escape(secret),
        );

        let response = self
            .http_client
            .post(self.partner_url())
            .headers(self.build_headers("login"))
            .body(envelope)
            .send()
            .await?;

        let response_text = response.text().await?;

        if let Some(fault) = parse_soap_fault(&response_text) {
            return Err(Error::new(ErrorKind::SoapFault(fault)));
        }

        let session_id = xml::extract_element(&response_text, "sessionId").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(
                "No sessionId in login response".to_string(),
            ))
        })?;
        let server_url = xml::extract_element(&response_text, "serverUrl").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(
                "No serverUrl in login response".to_string(),
            ))
        })?;
        let metadata_url =
            xml::extract_element(&response_text, "metadataServerUrl").ok_or_else(|| {
                Error::new(ErrorKind::InvalidResponse(
                    "No metadataServerUrl in login response".to_string(),
                ))
            })?;

        Ok(LoginResult {
            session_id,
            server_url,
            metadata_url,
        })
    }
}

/// Parse a SOAP fault from a response body, if one is present.
pub(crate) fn parse_soap_fault(xml_text: &str) -> Option<crate::types::SoapFault> {
    if !xml_text.contains("faultcode") {
        return None;
    }

    let fault_code = xml::extract_element(xml_text, "faultcode")?;
    let fault_string = xml::extract_element(xml_text, "faultstring")
        .unwrap_or_else(|| "Unknown error".to_string());

    Some(crate::types::SoapFault {
        fault_code,
        fault_string,
    })
}
