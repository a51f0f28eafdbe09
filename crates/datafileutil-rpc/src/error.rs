//! Error types for datafileutil-rpc

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fault object reported by the service in place of a result
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{name} (code {code}): {message}")]
pub struct ServerError {
    pub code: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub message: String,

    /// Server-side stack trace, if the service sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerError {
    /// Remote stack trace text
    pub fn trace(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Server error: {0}")]
    Server(ServerError),

    #[error("Response carries neither a result nor an error")]
    MissingResult,

    #[error("Response result list is empty")]
    EmptyResult,

    #[error("Response result is not a list: {0}")]
    NotAList(String),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RpcError>;
