//! RPC client implementation

use std::path::PathBuf;
use std::time::Duration;

use datafileutil_rpc::{
    CopyShockNodeOutput, CopyShockNodeParams, FileToShockOutput, FileToShockParams,
    GetObjectsParams, GetObjectsResults, Method, ObjectInfo, OwnShockNodeOutput,
    OwnShockNodeParams, PackFileParams, PackFileResult, PackageForDownloadOutput,
    PackageForDownloadParams, RpcContext, RpcRequest, RpcResponse, SaveObjectsParams,
    ServiceStatus, ShockToFileOutput, ShockToFileParams, UnpackFileParams, UnpackFileResult,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::auth::{AuthClient, AuthToken};
use crate::caller::RpcCaller;
use crate::config::ClientConfig;
use crate::error::Result;

/// Client for the DataFileUtil service
///
/// Cloning is cheap; clones share the connection pool but not settings
/// changed afterwards.
#[derive(Debug, Clone)]
pub struct DataFileUtilClient {
    caller: RpcCaller,
    auth: AuthClient,
    service_version: Option<String>,
    context: Option<RpcContext>,
}

impl DataFileUtilClient {
    /// Create an anonymous client
    ///
    /// Only `status` can be called without a token.
    pub fn new(url: impl AsRef<str>) -> Result<Self> {
        Self::build(ClientConfig::new(url)?)
    }

    /// Create a client with a token, validating it with the auth service
    pub async fn with_token(url: impl AsRef<str>, token: impl Into<String>) -> Result<Self> {
        let config = ClientConfig::new(url)?.with_token(AuthToken::new(token));
        Self::with_config(config).await
    }

    /// Create a client by logging in with a user name and password
    ///
    /// Any token already in `config` is replaced by the one issued at login.
    pub async fn with_credentials(config: ClientConfig, user: &str, password: &str) -> Result<Self> {
        let mut client = Self::build(config)?;
        let token = client.auth.login(user, password).await?;
        client.caller.set_token(Some(token));
        Ok(client)
    }

    /// Create a client from a full configuration
    ///
    /// A configured token is checked against the auth service first; an
    /// invalid token fails here, before any operation is attempted.
    pub async fn with_config(config: ClientConfig) -> Result<Self> {
        let mut client = Self::build(config)?;
        if let Some(token) = client.caller.token().cloned() {
            let validated = client.auth.validate_token(&token).await?;
            client.caller.set_token(Some(validated));
        }
        info!("DataFileUtil client ready for {}", client.caller.url());
        Ok(client)
    }

    fn build(config: ClientConfig) -> Result<Self> {
        let caller = RpcCaller::from_config(&config)?;
        let auth = AuthClient::new(caller.http().clone(), config.auth_url.clone())
            .with_insecure_http(config.allow_insecure_http);
        Ok(Self {
            caller,
            auth,
            service_version: config.service_version,
            context: None,
        })
    }

    /// A clone whose calls carry the given dispatch context
    pub fn with_context(&self, context: RpcContext) -> Self {
        let mut client = self.clone();
        client.context = Some(context);
        client
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Get the service URL
    pub fn url(&self) -> &Url {
        self.caller.url()
    }

    /// Get the token this client sends, if any
    pub fn token(&self) -> Option<&AuthToken> {
        self.caller.token()
    }

    /// Set the per-call deadline; `None` or zero waits forever
    ///
    /// The deadline covers the whole call: connecting, sending the request
    /// and reading the response.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.caller.set_read_timeout(timeout);
    }

    /// Set the per-call deadline in milliseconds; zero disables it
    pub fn set_read_timeout_millis(&mut self, millis: u64) {
        self.caller.set_read_timeout(Some(Duration::from_millis(millis)));
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.caller.read_timeout()
    }

    pub fn is_insecure_http_allowed(&self) -> bool {
        self.caller.is_insecure_http_allowed()
    }

    /// Allow plain http for both the service and the auth service
    pub fn set_insecure_http_allowed(&mut self, allowed: bool) {
        self.caller.set_insecure_http_allowed(allowed);
        self.auth = self.auth.clone().with_insecure_http(allowed);
    }

    pub fn is_all_certificates_trusted(&self) -> bool {
        self.caller.is_all_certificates_trusted()
    }

    pub fn set_all_certificates_trusted(&mut self, trust_all: bool) -> Result<()> {
        self.caller.set_all_certificates_trusted(trust_all)?;
        self.auth = AuthClient::new(self.caller.http().clone(), self.auth.url().clone())
            .with_insecure_http(self.caller.is_insecure_http_allowed());
        Ok(())
    }

    pub fn is_streaming_mode_on(&self) -> bool {
        self.caller.is_streaming_mode_on()
    }

    pub fn set_streaming_mode(&mut self, streaming: bool) {
        self.caller.set_streaming_mode(streaming);
    }

    pub fn service_version(&self) -> Option<&str> {
        self.service_version.as_deref()
    }

    pub fn set_service_version(&mut self, version: Option<String>) {
        self.service_version = version;
    }

    /// Copy the raw body of the next response to `path`
    pub fn set_file_for_next_rpc_response(&self, path: impl Into<PathBuf>) {
        self.caller.set_file_for_next_rpc_response(path);
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    async fn dispatch(&self, method: Method, args: Vec<Value>) -> Result<RpcResponse> {
        let request = RpcRequest::new(method, args)
            .with_context(self.context.clone(), self.service_version.as_deref());
        self.caller.call(method, request).await
    }

    /// Call a method taking one argument and returning one value
    async fn call_one<P, R>(&self, method: Method, param: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let args = vec![serde_json::to_value(param)?];
        Ok(self.dispatch(method, args).await?.into_first()?)
    }

    // ========================================================================
    // Shock Operations
    // ========================================================================

    /// Download a file from Shock
    pub async fn shock_to_file(&self, params: &ShockToFileParams) -> Result<ShockToFileOutput> {
        self.call_one(Method::ShockToFile, params).await
    }

    /// Download multiple files from Shock
    ///
    /// Result `i` corresponds to request `i`. Whether a failure on one node
    /// aborts the batch is up to the service.
    pub async fn shock_to_file_mass(
        &self,
        params: &[ShockToFileParams],
    ) -> Result<Vec<ShockToFileOutput>> {
        debug!("Downloading {} Shock nodes", params.len());
        self.call_one(Method::ShockToFileMass, params).await
    }

    /// Load a file to Shock
    pub async fn file_to_shock(&self, params: &FileToShockParams) -> Result<FileToShockOutput> {
        self.call_one(Method::FileToShock, params).await
    }

    /// Load multiple files to Shock
    pub async fn file_to_shock_mass(
        &self,
        params: &[FileToShockParams],
    ) -> Result<Vec<FileToShockOutput>> {
        debug!("Uploading {} files to Shock", params.len());
        self.call_one(Method::FileToShockMass, params).await
    }

    /// Copy a Shock node
    pub async fn copy_shock_node(&self, params: &CopyShockNodeParams) -> Result<CopyShockNodeOutput> {
        self.call_one(Method::CopyShockNode, params).await
    }

    /// Gain ownership of a Shock node, copying it if the caller does not own it
    pub async fn own_shock_node(&self, params: &OwnShockNodeParams) -> Result<OwnShockNodeOutput> {
        self.call_one(Method::OwnShockNode, params).await
    }

    // ========================================================================
    // Archive Operations
    // ========================================================================

    /// Decompress a file and unbundle it if it is an archive
    pub async fn unpack_file(&self, params: &UnpackFileParams) -> Result<UnpackFileResult> {
        self.call_one(Method::UnpackFile, params).await
    }

    /// Pack a file or directory into a gzip, targz or zip archive
    pub async fn pack_file(&self, params: &PackFileParams) -> Result<PackFileResult> {
        self.call_one(Method::PackFile, params).await
    }

    /// Bundle a file with workspace provenance and load it to Shock
    pub async fn package_for_download(
        &self,
        params: &PackageForDownloadParams,
    ) -> Result<PackageForDownloadOutput> {
        self.call_one(Method::PackageForDownload, params).await
    }

    // ========================================================================
    // Workspace Operations
    // ========================================================================

    /// Translate a workspace name to its numeric id
    pub async fn ws_name_to_id(&self, name: &str) -> Result<i64> {
        self.call_one(Method::WsNameToId, name).await
    }

    /// Save objects to a workspace; saving over a deleted object undeletes it
    pub async fn save_objects(&self, params: &SaveObjectsParams) -> Result<Vec<ObjectInfo>> {
        self.call_one(Method::SaveObjects, params).await
    }

    /// Get objects from the workspace
    pub async fn get_objects(&self, params: &GetObjectsParams) -> Result<GetObjectsResults> {
        self.call_one(Method::GetObjects, params).await
    }

    // ========================================================================
    // Service Information
    // ========================================================================

    /// Versions of the workspace and Shock services, in that order
    pub async fn versions(&self) -> Result<(String, String)> {
        Ok(self.dispatch(Method::Versions, Vec::new()).await?.into_tuple()?)
    }

    /// Service status; does not require a token
    pub async fn status(&self) -> Result<ServiceStatus> {
        Ok(self.dispatch(Method::Status, Vec::new()).await?.into_first()?)
    }
}
