//! Credentials and the auth service

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{ClientError, Result};

const TOKEN_PATH: &str = "api/V2/token";
const LOGIN_PATH: &str = "api/legacy/KBase/Sessions/Login";

/// A bearer credential
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    token: String,
    user_name: Option<String>,
}

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_name: None,
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Raw token text, as sent in the `Authorization` header
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Account the token belongs to, once known
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"<redacted>")
            .field("user_name", &self.user_name)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    user_id: Option<String>,
}

/// Client for the identity endpoint used to check credentials
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: Url,
    allow_insecure_http: bool,
}

impl AuthClient {
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
            allow_insecure_http: false,
        }
    }

    /// Allow credentials to be sent to a plain http auth service
    pub fn with_insecure_http(mut self, allowed: bool) -> Self {
        self.allow_insecure_http = allowed;
        self
    }

    /// Get the auth service root
    pub fn url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        if self.base_url.scheme() != "https" && !self.allow_insecure_http {
            return Err(ClientError::InsecureTransport(self.base_url.to_string()));
        }
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Connection(format!("Invalid auth URL: {}", e)))
    }

    /// Check a token with the auth service, filling in its user name
    pub async fn validate_token(&self, token: &AuthToken) -> Result<AuthToken> {
        let url = self.endpoint(TOKEN_PATH)?;
        debug!("Validating token against {}", url);

        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token.token())
            .send()
            .await
            .map_err(auth_unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(rejection(status, body));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| ClientError::Unauthorized(format!("Unreadable token info: {}", e)))?;

        let mut validated = token.clone();
        if let Some(user) = info.user {
            info!("Token validated for user {}", user);
            validated.user_name = Some(user);
        }
        Ok(validated)
    }

    /// Exchange a user name and password for a token
    pub async fn login(&self, user: &str, password: &str) -> Result<AuthToken> {
        let url = self.endpoint(LOGIN_PATH)?;
        debug!("Logging in {} at {}", user, url);

        let form = [
            ("user_id", user),
            ("password", password),
            ("fields", "token,user_id"),
        ];
        let response = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(auth_unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(rejection(status, body));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Unauthorized(format!("Unreadable login response: {}", e)))?;

        info!("Logged in as {}", user);
        Ok(AuthToken {
            token: login.token,
            user_name: Some(login.user_id.unwrap_or_else(|| user.to_string())),
        })
    }
}

fn auth_unreachable(e: reqwest::Error) -> ClientError {
    ClientError::Connection(format!("Auth service unreachable: {}", e))
}

fn rejection(status: StatusCode, body: String) -> ClientError {
    if status.is_server_error() {
        ClientError::Connection(format!("Auth service returned {}: {}", status, body))
    } else {
        ClientError::Unauthorized(format!("{}: {}", status, body))
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let token = AuthToken::new("SECRETTOKEN").with_user_name("alice");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("SECRETTOKEN"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_endpoints_join_under_root() {
        let auth = AuthClient::new(
            reqwest::Client::new(),
            "https://kbase.us/services/auth".parse().unwrap(),
        );
        assert_eq!(
            auth.endpoint(TOKEN_PATH).unwrap().as_str(),
            "https://kbase.us/services/auth/api/V2/token"
        );
        assert_eq!(
            auth.endpoint(LOGIN_PATH).unwrap().as_str(),
            "https://kbase.us/services/auth/api/legacy/KBase/Sessions/Login"
        );
    }

    #[tokio::test]
    async fn test_plain_http_auth_is_refused_by_default() {
        let url: Url = "http://127.0.0.1:1/auth/".parse().unwrap();
        let auth = AuthClient::new(reqwest::Client::new(), url.clone());

        let err = auth.validate_token(&AuthToken::new("t")).await.unwrap_err();
        assert!(matches!(err, ClientError::InsecureTransport(_)), "got {:?}", err);
        let err = auth.login("alice", "secret").await.unwrap_err();
        assert!(matches!(err, ClientError::InsecureTransport(_)), "got {:?}", err);

        let allowed = AuthClient::new(reqwest::Client::new(), url).with_insecure_http(true);
        assert!(allowed.endpoint(TOKEN_PATH).is_ok());
    }

    #[test]
    fn test_rejection_kinds() {
        assert!(matches!(
            rejection(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::Unauthorized(_)
        ));
        assert!(matches!(
            rejection(StatusCode::BAD_GATEWAY, String::new()),
            ClientError::Connection(_)
        ));
    }
}
