//! JSON-RPC 1.1 envelope
//!
//! Requests look like `{"method", "params", "version", "id", "context"?}`;
//! responses carry either a `result` list or an `error` object.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Result, RpcError, ServerError};
use crate::methods::Method;

/// Protocol version sent in every envelope
pub const JSON_RPC_VERSION: &str = "1.1";

/// Context key used to pin the deployed service version
pub const SERVICE_VERSION_KEY: &str = "service_ver";

/// Dispatch metadata attached to a request
///
/// Contexts change how the call is routed or attributed, never what it does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_stack: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl RpcContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_call_stack(mut self, call_stack: Vec<Value>) -> Self {
        self.call_stack = Some(call_stack);
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_additional_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.additional_properties.insert(key.into(), value);
        self
    }

    /// The pinned service version, if any
    pub fn service_version(&self) -> Option<&str> {
        self.additional_properties
            .get(SERVICE_VERSION_KEY)
            .and_then(Value::as_str)
    }
}

/// Outgoing request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: Vec<Value>,
    pub version: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<RpcContext>,
}

impl RpcRequest {
    /// Build a request with a fresh opaque id
    pub fn new(method: Method, params: Vec<Value>) -> Self {
        Self {
            method: method.qualified_name(),
            params,
            version: JSON_RPC_VERSION.to_string(),
            id: Uuid::new_v4().to_string(),
            context: None,
        }
    }

    /// Attach a dispatch context, merging in a pinned service version
    ///
    /// A version pin without a caller-supplied context creates an empty one
    /// to carry it.
    pub fn with_context(mut self, context: Option<RpcContext>, service_version: Option<&str>) -> Self {
        let context = match (context, service_version) {
            (ctx, Some(version)) => Some(ctx.unwrap_or_default().with_additional_property(
                SERVICE_VERSION_KEY,
                Value::String(version.to_string()),
            )),
            (ctx, None) => ctx,
        };
        self.context = context;
        self
    }
}

/// Incoming response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServerError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl RpcResponse {
    /// Successful response carrying the given result list
    pub fn success(result: Vec<Value>) -> Self {
        Self {
            version: Some(JSON_RPC_VERSION.to_string()),
            result: Some(Value::Array(result)),
            ..Default::default()
        }
    }

    /// Fault response
    pub fn fault(error: ServerError) -> Self {
        Self {
            version: Some(JSON_RPC_VERSION.to_string()),
            error: Some(error),
            ..Default::default()
        }
    }

    /// Parse an envelope from raw response bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The result list, or the service's fault
    fn into_result_list(self) -> Result<Vec<Value>> {
        if let Some(error) = self.error {
            return Err(RpcError::Server(error));
        }
        match self.result {
            Some(Value::Array(values)) => Ok(values),
            Some(other) => Err(RpcError::NotAList(other.to_string())),
            None => Err(RpcError::MissingResult),
        }
    }

    /// Decode element 0 of the result list
    pub fn into_first<T: DeserializeOwned>(self) -> Result<T> {
        let first = self
            .into_result_list()?
            .into_iter()
            .next()
            .ok_or(RpcError::EmptyResult)?;
        Ok(serde_json::from_value(first)?)
    }

    /// Decode the whole result list positionally
    ///
    /// Used by methods that return several values, e.g. `(String, String)`.
    pub fn into_tuple<T: DeserializeOwned>(self) -> Result<T> {
        let values = self.into_result_list()?;
        Ok(serde_json::from_value(Value::Array(values))?)
    }
}
