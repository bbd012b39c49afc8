//! Configuration management for the viewer.
//!
//! Server settings are loaded from (in priority order):
//! 1. Environment variables (`VIEWER__SERVER__` prefix)
//! 2. Config file (`viewer.toml`, `[server]` section)
//! 3. Defaults
//!
//! Graph credentials are resolved separately from an explicit, ordered list of
//! [`CredentialSource`]s. Later sources override earlier ones field by field.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ViewerError};

// ── Server Settings ───────────────────────────────────────────────

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory holding the tabular result datasets.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Filename suffix a file must carry to be listed as a dataset.
    #[serde(default = "default_dataset_suffix")]
    pub dataset_suffix: String,

    /// JSON document with the precomputed sample calls.
    #[serde(default = "default_sample_calls_path")]
    pub sample_calls_path: PathBuf,

    /// Static front-end assets served at `/`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// JSON credentials file for the graph store.
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_dataset_suffix() -> String {
    "_results.csv".to_string()
}

fn default_sample_calls_path() -> PathBuf {
    PathBuf::from("data/sample_calls.json")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("orchestrator_repo/credentials.json")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_dir: default_data_dir(),
            dataset_suffix: default_dataset_suffix(),
            sample_calls_path: default_sample_calls_path(),
            static_dir: default_static_dir(),
            credentials_file: default_credentials_file(),
        }
    }
}

impl ServerConfig {
    /// Load settings from `<file_prefix>.toml` and `VIEWER__` environment variables.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("VIEWER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match cfg.get::<ServerConfig>("server") {
            Ok(c) => Ok(c),
            Err(config::ConfigError::NotFound(_)) => Ok(ServerConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Credential sources for the graph store, lowest priority first.
    pub fn credential_sources(&self) -> Vec<CredentialSource> {
        vec![
            CredentialSource::File(self.credentials_file.clone()),
            CredentialSource::Environment,
        ]
    }
}

// ── Graph Credentials ─────────────────────────────────────────────

const URI_KEY: &str = "neo4j_uri";
const USERNAME_KEY: &str = "neo4j_username";
const PASSWORD_KEY: &str = "neo4j_password";

/// Environment variables consulted by [`CredentialSource::Environment`].
const ENV_VARS: [&str; 3] = ["NEO4J_URI", "NEO4J_USERNAME", "NEO4J_PASSWORD"];

/// Where graph credentials may come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// JSON document with `neo4j_uri`, `neo4j_username`, `neo4j_password`.
    /// A missing file contributes nothing.
    File(PathBuf),
    /// `NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`.
    Environment,
}

/// A complete address/username/password triple for the graph store.
#[derive(Clone, PartialEq, Eq)]
pub struct GraphCredentials {
    pub uri: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for GraphCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphCredentials")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl GraphCredentials {
    /// Resolve credentials from `sources`, later sources taking precedence.
    ///
    /// Fails with [`ViewerError::Config`] unless all three fields end up set.
    pub fn resolve(sources: &[CredentialSource]) -> Result<Self> {
        let env: HashMap<String, String> = ENV_VARS
            .iter()
            .filter_map(|k| std::env::var(k).ok().map(|v| (k.to_string(), v)))
            .collect();
        Self::resolve_with_env(sources, env)
    }

    fn resolve_with_env(
        sources: &[CredentialSource],
        env: HashMap<String, String>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();
        for source in sources {
            builder = match source {
                CredentialSource::File(path) => builder.add_source(json_file(path)),
                CredentialSource::Environment => {
                    builder.add_source(config::Environment::default().source(Some(env.clone())))
                }
            };
        }
        let cfg = builder.build()?;

        let field = |key: &str| cfg.get_string(key).ok().filter(|v| !v.is_empty());
        match (field(URI_KEY), field(USERNAME_KEY), field(PASSWORD_KEY)) {
            (Some(uri), Some(username), Some(password)) => {
                tracing::debug!(%uri, %username, "Resolved graph credentials");
                Ok(Self {
                    uri,
                    username,
                    password,
                })
            }
            (uri, username, password) => {
                let missing: Vec<&str> = [
                    (URI_KEY, uri.is_none()),
                    (USERNAME_KEY, username.is_none()),
                    (PASSWORD_KEY, password.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(key, _)| *key)
                .collect();
                Err(ViewerError::Config(format!(
                    "Neo4j credentials incomplete, missing: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

fn json_file(path: &Path) -> config::File<config::FileSourceFile, config::FileFormat> {
    config::File::from(path)
        .format(config::FileFormat::Json)
        .required(false)
}
