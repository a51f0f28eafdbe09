//! JSON-RPC transport over HTTP(S)

use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use datafileutil_rpc::{Method, RpcRequest, RpcResponse};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Body;
use tempfile::NamedTempFile;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthToken;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Longest slice of a non-JSON error body kept in an error message
const MAX_ERROR_BODY: usize = 2048;

/// Sends envelopes to a service endpoint and returns the parsed response
///
/// Settings are changed through `&mut self`, so they can never change while
/// a call borrowed from the same caller is in flight.
#[derive(Debug)]
pub struct RpcCaller {
    http: reqwest::Client,
    url: Url,
    token: Option<AuthToken>,
    read_timeout: Option<Duration>,
    allow_insecure_http: bool,
    trust_all_certificates: bool,
    streaming_mode: bool,
    /// Debug capture: raw bytes of the next response are copied here
    next_response_file: Mutex<Option<PathBuf>>,
}

impl RpcCaller {
    /// Create a caller from a configuration, without contacting anything
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config.trust_all_certificates)?,
            url: config.url.clone(),
            token: config.token.clone(),
            read_timeout: config.effective_timeout(),
            allow_insecure_http: config.allow_insecure_http,
            trust_all_certificates: config.trust_all_certificates,
            streaming_mode: config.streaming_mode,
            next_response_file: Mutex::new(None),
        })
    }

    /// HTTP client shared with the auth service lookups
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub(crate) fn set_token(&mut self, token: Option<AuthToken>) {
        self.token = token;
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Set the per-call deadline; `None` or zero waits forever
    ///
    /// Applied with `RequestBuilder::timeout`, so it bounds connecting,
    /// sending the body and reading the response together.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout.filter(|d| !d.is_zero());
    }

    pub fn is_insecure_http_allowed(&self) -> bool {
        self.allow_insecure_http
    }

    pub fn set_insecure_http_allowed(&mut self, allowed: bool) {
        self.allow_insecure_http = allowed;
    }

    pub fn is_all_certificates_trusted(&self) -> bool {
        self.trust_all_certificates
    }

    /// Trust every TLS certificate, including self-signed ones
    ///
    /// Rebuilds the underlying HTTP client.
    pub fn set_all_certificates_trusted(&mut self, trust_all: bool) -> Result<()> {
        if trust_all != self.trust_all_certificates {
            self.http = build_http(trust_all)?;
            self.trust_all_certificates = trust_all;
        }
        Ok(())
    }

    pub fn is_streaming_mode_on(&self) -> bool {
        self.streaming_mode
    }

    /// Stream request bodies from disk rather than buffering them
    ///
    /// Many servers do not accept chunked request bodies.
    pub fn set_streaming_mode(&mut self, streaming: bool) {
        self.streaming_mode = streaming;
    }

    /// Copy the raw body of the next response to `path`
    pub fn set_file_for_next_rpc_response(&self, path: impl Into<PathBuf>) {
        *self.response_slot() = Some(path.into());
    }

    fn response_slot(&self) -> std::sync::MutexGuard<'_, Option<PathBuf>> {
        self.next_response_file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Send one envelope and parse the response envelope
    ///
    /// A fault object in the body is returned as `ClientError::Server`, even
    /// when it arrives with a non-2xx status.
    pub async fn call(&self, method: Method, request: RpcRequest) -> Result<RpcResponse> {
        // The capture registration belongs to this call even if it fails early
        let capture = self.response_slot().take();

        if self.url.scheme() != "https" && !self.allow_insecure_http {
            return Err(ClientError::InsecureTransport(self.url.to_string()));
        }
        if method.requires_auth() && self.token.is_none() {
            return Err(ClientError::AuthRequired(format!(
                "{} requires a token but none was provided",
                method
            )));
        }

        debug!("Calling {} at {}", method, self.url);

        // Keeps the spooled request alive until the response arrives
        let mut spool: Option<NamedTempFile> = None;
        let body = if self.streaming_mode {
            let file = tokio::task::spawn_blocking(move || spool_request(&request))
                .await
                .map_err(|e| ClientError::Io(std::io::Error::other(e)))??;
            let reader = tokio::fs::File::open(file.path()).await?;
            spool = Some(file);
            Body::wrap_stream(ReaderStream::new(reader))
        } else {
            Body::from(serde_json::to_vec(&request)?)
        };

        let mut builder = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, token.token());
        }
        if let Some(timeout) = self.read_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(ClientError::from_transport)?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(ClientError::from_transport)?;
        drop(spool);

        if let Some(path) = capture {
            debug!("Writing raw {} response to {:?}", method, path);
            tokio::fs::write(&path, &bytes).await?;
        }

        if !status.is_success() {
            if let Ok(RpcResponse {
                error: Some(fault), ..
            }) = RpcResponse::from_slice(&bytes)
            {
                warn!("{} failed with status {}: {}", method, status, fault);
                return Err(ClientError::Server(fault));
            }
            let body = String::from_utf8_lossy(&bytes);
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let envelope = RpcResponse::from_slice(&bytes)?;
        if let Some(fault) = &envelope.error {
            warn!("{} reported a fault: {}", method, fault);
        }
        Ok(envelope)
    }
}

impl Clone for RpcCaller {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            url: self.url.clone(),
            token: self.token.clone(),
            read_timeout: self.read_timeout,
            allow_insecure_http: self.allow_insecure_http,
            trust_all_certificates: self.trust_all_certificates,
            streaming_mode: self.streaming_mode,
            // Response capture is armed per caller, never inherited
            next_response_file: Mutex::new(None),
        }
    }
}

fn build_http(trust_all_certificates: bool) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .danger_accept_invalid_certs(trust_all_certificates)
        .build()?)
}

/// Serialize a request into a temporary file
fn spool_request(request: &RpcRequest) -> Result<NamedTempFile> {
    let file = NamedTempFile::new()?;
    let mut writer = BufWriter::new(file.as_file());
    serde_json::to_writer(&mut writer, request)?;
    writer.flush()?;
    drop(writer);
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn caller(url: &str) -> RpcCaller {
        RpcCaller::from_config(&ClientConfig::new(url).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_plain_http_is_refused_by_default() {
        let caller = caller("http://127.0.0.1:1/");
        let request = RpcRequest::new(Method::Status, vec![]);
        let err = caller.call(Method::Status, request).await.unwrap_err();
        assert!(matches!(err, ClientError::InsecureTransport(_)));
    }

    #[tokio::test]
    async fn test_auth_required_without_token() {
        let caller = caller("https://127.0.0.1:1/");
        let request = RpcRequest::new(Method::Versions, vec![]);
        let err = caller.call(Method::Versions, request).await.unwrap_err();
        assert!(matches!(err, ClientError::AuthRequired(_)));
    }

    #[tokio::test]
    async fn test_failed_call_consumes_response_capture() {
        let caller = caller("http://127.0.0.1:1/");
        caller.set_file_for_next_rpc_response("/tmp/capture.json");

        let request = RpcRequest::new(Method::Status, vec![]);
        let err = caller.call(Method::Status, request).await.unwrap_err();
        assert!(matches!(err, ClientError::InsecureTransport(_)));
        assert!(caller.response_slot().is_none());
    }

    #[test]
    fn test_spooled_request_matches_buffered() {
        let request = RpcRequest::new(Method::UnpackFile, vec![json!({"file_path": "/a.tgz"})]);
        let file = spool_request(&request).unwrap();
        let spooled = std::fs::read(file.path()).unwrap();
        assert_eq!(spooled, serde_json::to_vec(&request).unwrap());
    }

    #[test]
    fn test_zero_timeout_is_cleared() {
        let mut caller = caller("https://example.org/");
        caller.set_read_timeout(Some(Duration::ZERO));
        assert_eq!(caller.read_timeout(), None);
        caller.set_read_timeout(Some(Duration::from_secs(5)));
        assert_eq!(caller.read_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_clone_drops_response_capture() {
        let caller = caller("https://example.org/");
        caller.set_file_for_next_rpc_response("/tmp/capture.json");
        let cloned = caller.clone();
        assert!(cloned.response_slot().is_none());
        assert!(caller.response_slot().is_some());
    }
}
