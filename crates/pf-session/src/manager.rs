//! Session acquisition and the retry-with-refresh wrapper.

use std::future::Future;

use packforge_soap::PartnerClient;
use tracing::{debug, instrument};

use crate::credentials::LoginCredentials;
use crate::error::Result;
use crate::fingerprint;
use crate::store::{FileSessionStore, SessionInfo, StoredSession};
use crate::PRODUCTION_LOGIN_URL;

/// Owns the credentials, the session store, and the login client.
///
/// Every remote operation in the system goes through [`with_session`];
/// that is the single place where an `sf:INVALID_SESSION_ID` fault turns
/// into one re-authentication and one retry.
///
/// [`with_session`]: SessionManager::with_session
pub struct SessionManager {
    credentials: LoginCredentials,
    api_version: String,
    store: FileSessionStore,
    partner: PartnerClient,
    machine_salt: String,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.credentials)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager for the given credentials and store.
    pub fn new(
        credentials: LoginCredentials,
        api_version: impl Into<String>,
        store: FileSessionStore,
    ) -> Self {
        let api_version = api_version.into();
        let login_url = credentials
            .login_url
            .clone()
            .unwrap_or_else(|| PRODUCTION_LOGIN_URL.to_string());
        let partner = PartnerClient::new(login_url, api_version.clone());

        Self {
            credentials,
            api_version,
            store,
            partner,
            machine_salt: fingerprint::machine_salt(),
        }
    }

    /// The login endpoint this manager authenticates against.
    fn endpoint(&self) -> String {
        format!(
            "{}/services/Soap/u/{}",
            self.credentials
                .login_url
                .as_deref()
                .unwrap_or(PRODUCTION_LOGIN_URL)
                .trim_end_matches('/'),
            self.api_version
        )
    }

    fn creds_fingerprint(&self) -> String {
        fingerprint::credentials_fingerprint(&self.credentials, &self.machine_salt)
    }

    fn connection_fingerprint(&self) -> String {
        fingerprint::connection_fingerprint(&self.endpoint(), &self.machine_salt)
    }

    /// Get a session: cached when the stored record matches the current
    /// credentials and endpoint, fresh login otherwise.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<SessionInfo> {
        if let Some(stored) = self.store.load()? {
            if stored.session.is_complete()
                && stored.creds_fingerprint == self.creds_fingerprint()
                && stored.connection_fingerprint == self.connection_fingerprint()
            {
                debug!("using cached session");
                return Ok(stored.session);
            }
            debug!("session cache invalid");
        }

        self.refresh().await
    }

    /// Log in unconditionally and persist the fresh session.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<SessionInfo> {
        self.credentials.validate()?;

        let login = self
            .partner
            .login(&self.credentials.username, &self.credentials.secret())
            .await?;

        let session = SessionInfo {
            session_id: login.session_id,
            metadata_url: login.metadata_url,
        };

        self.store.save(&StoredSession {
            session: session.clone(),
            creds_fingerprint: self.creds_fingerprint(),
            connection_fingerprint: self.connection_fingerprint(),
            stored_at: chrono::Utc::now(),
        })?;

        Ok(session)
    }

    /// Run `action` with a valid session.
    ///
    /// If the action fails with the invalid-session fault, re-authenticate
    /// and re-run it exactly once. Any other failure propagates unchanged.
    /// Callers pass a whole unit of work (e.g. one full query round) so a
    /// stale session costs one coordinated re-login, never one per request.
    pub async fn with_session<T, F, Fut>(&self, action: F) -> Result<T>
    where
        F: Fn(SessionInfo) -> Fut,
        Fut: Future<Output = packforge_soap::Result<T>>,
    {
        let session = self.acquire().await?;

        match action(session).await {
            Ok(value) => Ok(value),
            Err(err) if err.is_invalid_session() => {
                debug!("session rejected by service, re-authenticating once");
                let fresh = self.refresh().await?;
                action(fresh).await.map_err(Into::into)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOGIN_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <loginResponse>
      <result>
        <metadataServerUrl>https://na1.salesforce.com/services/Soap/m/44.0</metadataServerUrl>
        <serverUrl>https://na1.salesforce.com/services/Soap/u/44.0</serverUrl>
        <sessionId>FRESH_SESSION</sessionId>
      </result>
    </loginResponse>
  </soapenv:Body>
</soapenv:Envelope>"#;

    fn manager_for(server: &MockServer, dir: &TempDir) -> SessionManager {
        let creds = LoginCredentials::new("user@example.com", "hunter2")
            .with_login_url(server.uri());
        SessionManager::new(
            creds,
            "44.0",
            FileSessionStore::at(dir.path().join("session.json")),
        )
    }

    fn invalid_session_error() -> packforge_soap::Error {
        packforge_soap::Error::new(packforge_soap::ErrorKind::SoapFault(
            packforge_soap::SoapFault {
                fault_code: packforge_soap::INVALID_SESSION_CODE.to_string(),
                fault_string: "Invalid Session ID".to_string(),
            },
        ))
    }

    #[tokio::test]
    async fn test_acquire_logs_in_then_caches() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("POST"))
            .and(path("/services/Soap/u/44.0"))
            .and(body_string_contains("user@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_RESPONSE))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server, &dir);

        let first = manager.acquire().await.unwrap();
        assert_eq!(first.session_id, "FRESH_SESSION");

        // Second acquire must come from the cache file: the mock allows
        // exactly one login call.
        let second = manager.acquire().await.unwrap();
        assert_eq!(second.session_id, "FRESH_SESSION");
    }

    #[tokio::test]
    async fn test_stale_fingerprint_forces_login() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("POST"))
            .and(path("/services/Soap/u/44.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_RESPONSE))
            .expect(2)
            .mount(&server)
            .await;

        manager_for(&server, &dir).acquire().await.unwrap();

        // Same store, different password: cached record no longer matches.
        let creds = LoginCredentials::new("user@example.com", "changed")
            .with_login_url(server.uri());
        let manager = SessionManager::new(
            creds,
            "44.0",
            FileSessionStore::at(dir.path().join("session.json")),
        );
        manager.acquire().await.unwrap();
    }

    #[tokio::test]
    async fn test_with_session_retries_once_on_invalid_session() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("POST"))
            .and(path("/services/Soap/u/44.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_RESPONSE))
            .expect(2)
            .mount(&server)
            .await;

        let manager = manager_for(&server, &dir);
        let attempts = AtomicUsize::new(0);

        let value = manager
            .with_session(|_session| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(invalid_session_error())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_session_does_not_retry_other_faults() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("POST"))
            .and(path("/services/Soap/u/44.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_RESPONSE))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server, &dir);
        let attempts = AtomicUsize::new(0);

        let result: Result<i32> = manager
            .with_session(|_session| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(packforge_soap::Error::new(
                        packforge_soap::ErrorKind::Http("boom".to_string()),
                    ))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_session_twice_gives_up() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("POST"))
            .and(path("/services/Soap/u/44.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_RESPONSE))
            .expect(2)
            .mount(&server)
            .await;

        let manager = manager_for(&server, &dir);
        let attempts = AtomicUsize::new(0);

        let result: Result<i32> = manager
            .with_session(|_session| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(invalid_session_error()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
