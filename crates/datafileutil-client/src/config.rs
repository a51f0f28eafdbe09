//! Client configuration

use std::time::Duration;

use url::Url;

use crate::auth::AuthToken;
use crate::error::{ClientError, Result};

/// Default KBase auth service root
pub const DEFAULT_AUTH_URL: &str = "https://kbase.us/services/auth/";

/// Environment variable holding the service URL
pub const URL_ENV: &str = "DATAFILEUTIL_URL";

/// Environment variable holding the auth token
pub const TOKEN_ENV: &str = "KB_AUTH_TOKEN";

/// Environment variable overriding the auth service root
pub const AUTH_URL_ENV: &str = "KB_AUTH_URL";

/// Configuration for a DataFileUtil client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service endpoint
    pub url: Url,

    /// Credential sent as the `Authorization` header
    pub token: Option<AuthToken>,

    /// Auth service root used to validate the token
    pub auth_url: Url,

    /// Per-call deadline covering connect, upload and response (None or zero = wait forever)
    pub read_timeout: Option<Duration>,

    /// Allow plain http endpoints
    pub allow_insecure_http: bool,

    /// Accept any TLS certificate, including self-signed ones
    pub trust_all_certificates: bool,

    /// Stream request bodies from a temporary file instead of memory
    pub streaming_mode: bool,

    /// Deployed service version to dispatch to
    pub service_version: Option<String>,
}

impl ClientConfig {
    /// Create a configuration for the given service URL with defaults
    pub fn new(url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            url: parse_url(url.as_ref())?,
            token: None,
            auth_url: parse_url(DEFAULT_AUTH_URL)?,
            read_timeout: None,
            allow_insecure_http: false,
            trust_all_certificates: false,
            streaming_mode: false,
            service_version: None,
        })
    }

    /// Build a configuration from `DATAFILEUTIL_URL`, `KB_AUTH_TOKEN` and `KB_AUTH_URL`
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(URL_ENV)
            .map_err(|_| ClientError::Connection(format!("{} is not set", URL_ENV)))?;
        let mut config = Self::new(url)?;

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                config.token = Some(AuthToken::new(token));
            }
        }
        if let Ok(auth_url) = std::env::var(AUTH_URL_ENV) {
            config.auth_url = parse_url(&auth_url)?;
        }

        Ok(config)
    }

    pub fn with_token(mut self, token: AuthToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_auth_url(mut self, auth_url: impl AsRef<str>) -> Result<Self> {
        self.auth_url = parse_url(auth_url.as_ref())?;
        Ok(self)
    }

    /// Set the per-call deadline in milliseconds; zero disables it
    pub fn with_read_timeout_millis(mut self, millis: u64) -> Self {
        self.read_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        self
    }

    pub fn with_insecure_http(mut self, allowed: bool) -> Self {
        self.allow_insecure_http = allowed;
        self
    }

    pub fn with_trust_all_certificates(mut self, trust_all: bool) -> Self {
        self.trust_all_certificates = trust_all;
        self
    }

    pub fn with_streaming_mode(mut self, streaming: bool) -> Self {
        self.streaming_mode = streaming;
        self
    }

    pub fn with_service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = Some(version.into());
        self
    }

    /// Effective read timeout, treating zero as no timeout
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.read_timeout.filter(|d| !d.is_zero())
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    raw.parse()
        .map_err(|e| ClientError::Connection(format!("Invalid URL {}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://kbase.us/services/DataFileUtil").unwrap();
        assert!(config.token.is_none());
        assert!(!config.allow_insecure_http);
        assert!(!config.trust_all_certificates);
        assert!(!config.streaming_mode);
        assert_eq!(config.effective_timeout(), None);
        assert_eq!(config.auth_url.as_str(), DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = ClientConfig::new("https://example.org/")
            .unwrap()
            .with_read_timeout_millis(0);
        assert_eq!(config.effective_timeout(), None);

        let config = config.with_read_timeout_millis(1500);
        assert_eq!(config.effective_timeout(), Some(Duration::from_millis(1500)));

        let mut config = config;
        config.read_timeout = Some(Duration::ZERO);
        assert_eq!(config.effective_timeout(), None);
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ClientError::Connection(_))
        ));
    }
}
