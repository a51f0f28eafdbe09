//! Error types for datafileutil-client

use datafileutil_rpc::{RpcError, ServerError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The auth service rejected the credential while constructing a client
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A method needing a credential was called on an anonymous client
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Insecure transport refused for {0}; use https or allow insecure http")]
    InsecureTransport(String),

    #[error("Timeout")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Protocol error: {0}")]
    Protocol(RpcError),

    #[error("Server error: {0}")]
    Server(ServerError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The service's fault object, if the service reported this failure
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            ClientError::Server(e) => Some(e),
            _ => None,
        }
    }

    /// Classify a transport failure from the HTTP stack
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_connect() {
            ClientError::Connection(e.to_string())
        } else {
            ClientError::Http(e)
        }
    }
}

impl From<RpcError> for ClientError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Server(fault) => ClientError::Server(fault),
            other => ClientError::Protocol(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
