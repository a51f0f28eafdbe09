//! DataFileUtil Client - Client library for the DataFileUtil service
//!
//! This crate provides:
//! - JSON-RPC 1.1 transport over HTTP(S), buffered or streamed from disk
//! - Credential validation and login against the auth service
//! - A typed method per remote DataFileUtil operation

pub mod auth;
pub mod caller;
pub mod client;
pub mod config;
pub mod error;

pub use auth::*;
pub use caller::*;
pub use client::*;
pub use config::*;
pub use error::*;
