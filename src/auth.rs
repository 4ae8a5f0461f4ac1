//! OAuth2 credentials for the Live APIs.
//!
//! The [`TokenStore`] is the only writer of the current [`Credentials`];
//! every [`Authenticator`] handed out reads the same cell, so a request
//! decorated after a refresh always carries the newest access token.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::AppCredentials;
use crate::error::{DriveError, Result};
use crate::executor::Executor;
use crate::request::{RequestDescriptor, RequestGenerator};

/// Query parameter carrying the access token on content requests.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Token pair returned by the authorization endpoint.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Shared slot holding an immutable credentials snapshot.
type CredentialCell = Arc<RwLock<Arc<Credentials>>>;

/// Decorates content requests with the current access token.
#[derive(Clone, Debug)]
pub struct Authenticator {
    credentials: CredentialCell,
}

impl Authenticator {
    /// The access token as of now.
    pub async fn access_token(&self) -> String {
        self.credentials.read().await.access_token.clone()
    }

    /// Append `access_token=<token>` to the request's query string.
    pub async fn authenticate(&self, request: RequestDescriptor) -> RequestDescriptor {
        let token = self.access_token().await;
        request.with_query(ACCESS_TOKEN_PARAM, &token)
    }
}

/// Owns the credentials and runs the code and refresh-token exchanges.
#[derive(Debug)]
pub struct TokenStore {
    app: AppCredentials,
    generator: RequestGenerator,
    authorization: Executor,
    credentials: CredentialCell,
}

impl TokenStore {
    /// `authorization` must be an executor for the authorization host
    /// without an authenticator attached.
    pub fn new(app: AppCredentials, authorization: Executor, initial: Credentials) -> Self {
        Self {
            app,
            generator: RequestGenerator::new(),
            authorization,
            credentials: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// An authenticator reading this store's credentials.
    pub fn authenticator(&self) -> Authenticator {
        Authenticator {
            credentials: Arc::clone(&self.credentials),
        }
    }

    pub fn app(&self) -> &AppCredentials {
        &self.app
    }

    pub fn authorization_base_url(&self) -> &str {
        self.authorization.base_url()
    }

    /// Current credentials snapshot.
    pub async fn current(&self) -> Arc<Credentials> {
        Arc::clone(&*self.credentials.read().await)
    }

    /// Exchange an authorization code for a fresh token pair.
    pub async fn exchange_code(&self, authorization_code: &str) -> Result<Credentials> {
        if authorization_code.is_empty() {
            return Err(DriveError::ArgumentError("authorization_code"));
        }

        let request = self.generator.access_token(
            &self.app.client_id,
            &self.app.client_secret,
            &self.app.redirect_uri,
            authorization_code,
        );
        let credentials: Credentials = self.authorization.execute_json(request).await?;
        self.replace(credentials.clone()).await;
        tracing::debug!("access token obtained from authorization code");
        Ok(credentials)
    }

    /// Exchange the stored refresh token for a fresh token pair.
    pub async fn refresh(&self) -> Result<Credentials> {
        let refresh_token = self
            .current()
            .await
            .refresh_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| DriveError::AuthenticationError("no refresh token available".to_string()))?;

        let request = self.generator.refresh_token(
            &self.app.client_id,
            &self.app.client_secret,
            &self.app.redirect_uri,
            &refresh_token,
        );
        let credentials: Credentials = self.authorization.execute_json(request).await?;
        self.replace(credentials.clone()).await;
        tracing::debug!("access token refreshed");
        Ok(credentials)
    }

    /// Swap in a new snapshot. The whole value is replaced, including an
    /// absent refresh token.
    async fn replace(&self, credentials: Credentials) {
        let mut slot = self.credentials.write().await;
        *slot = Arc::new(credentials);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VerbOverrideStyle;

    fn store(initial: Credentials) -> TokenStore {
        let app = AppCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "https://example.com/cb".to_string(),
        };
        let executor = Executor::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            VerbOverrideStyle::Header,
        );
        TokenStore::new(app, executor, initial)
    }

    #[test]
    fn test_credentials_deserialize() {
        let json = r#"{
            "token_type": "bearer",
            "expires_in": 3600,
            "scope": "wl.offline_access wl.skydrive_update",
            "access_token": "EwAo",
            "refresh_token": "MCdz",
            "authentication_token": "eyJh"
        }"#;

        let credentials: Credentials = serde_json::from_str(json).unwrap();
        assert_eq!(credentials.access_token, "EwAo");
        assert_eq!(credentials.refresh_token.as_deref(), Some("MCdz"));
        assert_eq!(credentials.expires_in, Some(3600));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials::new("secret-access", Some("secret-refresh".to_string()));
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }

    #[tokio::test]
    async fn test_authenticator_sees_replacement() {
        let store = store(Credentials::new("old", None));
        let authenticator = store.authenticator();
        assert_eq!(authenticator.access_token().await, "old");

        store.replace(Credentials::new("new", None)).await;
        assert_eq!(authenticator.access_token().await, "new");
    }

    #[tokio::test]
    async fn test_authenticate_appends_query_parameter() {
        let store = store(Credentials::new("tok", None));
        let request = RequestGenerator::new().get(Some("123"));
        let request = store.authenticator().authenticate(request).await;
        let url = request.build_url("http://localhost").unwrap();
        assert_eq!(url.as_str(), "http://localhost/123?access_token=tok");
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_fails() {
        let store = store(Credentials::new("tok", None));
        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, DriveError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn test_exchange_requires_code() {
        let store = store(Credentials::default());
        let err = store.exchange_code("").await.unwrap_err();
        assert!(matches!(err, DriveError::ArgumentError("authorization_code")));
    }
}
