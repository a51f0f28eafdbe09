//! DataFileUtil RPC - JSON-RPC protocol definitions
//!
//! This crate defines:
//! - The JSON-RPC 1.1 request/response envelope
//! - The catalog of remote methods
//! - Request parameter and result records

pub mod envelope;
pub mod error;
pub mod methods;
pub mod types;

pub use envelope::*;
pub use error::*;
pub use methods::*;
pub use types::*;
