//! Client configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Live authorization host.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://login.live.com";

/// SkyDrive content API base.
pub const DEFAULT_CONTENT_BASE_URL: &str = "https://apis.live.net/v5.0/";

/// How COPY and MOVE reach the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerbOverrideStyle {
    /// POST carrying `X-HTTP-Method-Override: <verb>`.
    #[default]
    Header,
    /// The verb itself as the HTTP method.
    Verb,
}

/// Application registration used for the OAuth2 exchanges.
#[derive(Clone, Deserialize)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Client configuration
#[derive(Clone)]
pub struct ClientConfig {
    pub app: AppCredentials,
    /// Token from a previous session, if any
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub auth_base_url: String,
    pub content_base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    pub verb_override: VerbOverrideStyle,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("app", &self.app)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("auth_base_url", &self.auth_base_url)
            .field("content_base_url", &self.content_base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("verb_override", &self.verb_override)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new config for a registered application.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self::from_app(AppCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        })
    }

    pub fn from_app(app: AppCredentials) -> Self {
        Self {
            app,
            access_token: None,
            refresh_token: None,
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            content_base_url: DEFAULT_CONTENT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("sky_drive/{}", env!("CARGO_PKG_VERSION")),
            verb_override: VerbOverrideStyle::default(),
        }
    }

    /// Load the application registration from a JSON file with
    /// `client_id`, `client_secret` and `redirect_uri`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let app: AppCredentials = serde_json::from_str(&content)?;
        Ok(Self::from_app(app))
    }

    /// Resume with tokens obtained earlier.
    pub fn with_tokens(mut self, access_token: Option<String>, refresh_token: Option<String>) -> Self {
        self.access_token = access_token;
        self.refresh_token = refresh_token;
        self
    }

    /// Point both hosts somewhere else, e.g. a mock server.
    pub fn with_base_urls(mut self, auth_base_url: impl Into<String>, content_base_url: impl Into<String>) -> Self {
        self.auth_base_url = auth_base_url.into();
        self.content_base_url = content_base_url.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_verb_override(mut self, style: VerbOverrideStyle) -> Self {
        self.verb_override = style;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("id", "secret", "https://example.com/cb");
        assert_eq!(config.auth_base_url, DEFAULT_AUTH_BASE_URL);
        assert_eq!(config.content_base_url, DEFAULT_CONTENT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.verb_override, VerbOverrideStyle::Header);
        assert!(config.user_agent.starts_with("sky_drive/"));
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = ClientConfig::new("id", "very-secret", "https://example.com/cb")
            .with_tokens(Some("access-tok".to_string()), None);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("access-tok"));
    }
}
