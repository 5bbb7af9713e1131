//! Configuration management for FileChain
//!
//! Both binaries read `filechain.toml` (or the file given with `--config`).
//! A missing file means "all defaults"; command-line flags override values
//! from the file.

use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "filechain.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Inputs of one signing run.
#[derive(Debug, Clone, Deserialize)]
pub struct SignerConfig {
    /// File whose SHA-256 is compared with the block's `file_hash`.
    #[serde(default)]
    pub file_path: PathBuf,
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_private_key_path")]
    pub private_key_path: PathBuf,
    #[serde(default = "default_public_key_path")]
    pub public_key_path: PathBuf,
    #[serde(default)]
    pub signer_id: String,
    #[serde(default = "default_block_index")]
    pub block_index: u64,
    /// POST the payload to `/sign_block` after printing it.
    #[serde(default)]
    pub submit: bool,
    /// Turn file-hash and key-pair mismatches into errors instead of warnings.
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::new(),
            server_url: default_server_url(),
            private_key_path: default_private_key_path(),
            public_key_path: default_public_key_path(),
            signer_id: String::new(),
            block_index: default_block_index(),
            submit: false,
            strict: false,
            timeout_secs: default_timeout(),
        }
    }
}

impl SignerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.file_path.as_os_str().is_empty() {
            return Err(LedgerError::ConfigError(
                "signer.file_path must be set (or pass --file)".to_string(),
            ));
        }
        if self.signer_id.trim().is_empty() {
            return Err(LedgerError::ConfigError(
                "signer.signer_id must be set (or pass --signer-id)".to_string(),
            ));
        }
        let url = self.server_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(LedgerError::ConfigError(format!(
                "signer.server_url must be an http(s) URL, got '{}'",
                self.server_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(LedgerError::ConfigError(
                "signer.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `blockchain.json` + `signatures.json`
    #[default]
    Json,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_chain_path")]
    pub chain_path: PathBuf,
    #[serde(default = "default_signatures_path")]
    pub signatures_path: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            chain_path: default_chain_path(),
            signatures_path: default_signatures_path(),
            database_path: default_database_path(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_private_key_path() -> PathBuf {
    PathBuf::from("private_key.pem")
}

fn default_public_key_path() -> PathBuf {
    PathBuf::from("public_key.pem")
}

fn default_block_index() -> u64 {
    1
}

fn default_timeout() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_chain_path() -> PathBuf {
    PathBuf::from("blockchain.json")
}

fn default_signatures_path() -> PathBuf {
    PathBuf::from("signatures.json")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("filechain.db")
}

pub fn parse_config(config_str: &str) -> Result<Config> {
    Ok(toml::from_str(config_str)?)
}

/// Loads `path`, falling back to defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    match fs::read_to_string(path) {
        Ok(config_str) => parse_config(&config_str),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(LedgerError::ConfigError(format!(
            "Cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}
