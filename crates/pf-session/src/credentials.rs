//! Login credentials with redacted Debug output.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// Username/password credentials for the Partner login call.
///
/// Sensitive fields (password, security token) are redacted in Debug output
/// to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
    /// Security token appended to the password for the login call.
    #[serde(default, alias = "token")]
    pub security_token: String,
    /// Login endpoint override, e.g. a sandbox or My Domain URL.
    #[serde(default, alias = "url")]
    pub login_url: Option<String>,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl LoginCredentials {
    /// Create credentials with the given username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            security_token: String::new(),
            login_url: None,
        }
    }

    /// Set the security token.
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = token.into();
        self
    }

    /// Set the login endpoint.
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }

    /// Read credentials from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            Error::with_source(
                ErrorKind::Config(format!(
                    "unable to read credential file {}",
                    path.as_ref().display()
                )),
                err,
            )
        })?;
        let creds: Self = serde_json::from_str(&text).map_err(|err| {
            Error::with_source(
                ErrorKind::Config(format!(
                    "credential file {} is not valid",
                    path.as_ref().display()
                )),
                err,
            )
        })?;
        creds.validate()?;
        Ok(creds)
    }

    /// Check the credentials are usable.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "username and password are required".to_string(),
            )));
        }
        Ok(())
    }

    /// The password-with-token string the Partner login call expects.
    pub(crate) fn secret(&self) -> String {
        format!("{}{}", self.password, self.security_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = LoginCredentials::new("user@example.com", "hunter2")
            .with_security_token("TOKEN123");
        let debug = format!("{creds:?}");

        assert!(debug.contains("user@example.com"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("TOKEN123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_secret_concatenates_token() {
        let creds = LoginCredentials::new("u", "pass").with_security_token("TOK");
        assert_eq!(creds.secret(), "passTOK");

        let creds = LoginCredentials::new("u", "pass");
        assert_eq!(creds.secret(), "pass");
    }

    #[test]
    fn test_from_json_with_aliases() {
        let json = r#"{"username":"u@x.com","password":"p","token":"T","url":"https://test.salesforce.com"}"#;
        let creds: LoginCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.security_token, "T");
        assert_eq!(
            creds.login_url.as_deref(),
            Some("https://test.salesforce.com")
        );
    }

    #[test]
    fn test_validate_rejects_empty() {
        let creds = LoginCredentials::new("", "");
        assert!(creds.validate().is_err());
    }
}
