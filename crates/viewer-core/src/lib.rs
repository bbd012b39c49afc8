//! viewer-core: Shared configuration and error handling for the earnings results viewer.
//!
//! This crate provides the pieces every other viewer crate agrees on:
//! - Server settings (bind address, data directory, static assets)
//! - Ordered credential sources for the graph store
//! - The common configuration error type

pub mod config;
pub mod error;

pub use config::{CredentialSource, GraphCredentials, ServerConfig};
pub use error::{Result, ViewerError};
