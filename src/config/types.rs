//! Core configuration types.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use super::accounts::AccountBlock;
use super::flood::FloodConfig;
use super::validation::{self, ValidationError};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    pub server: ServerConfig,
    /// Network listen configuration.
    pub listen: ListenConfig,
    /// Flood protection parameters.
    #[serde(default)]
    pub flood: FloodConfig,
    /// Ban store selection.
    #[serde(default)]
    pub bans: BansConfig,
    /// Agreement shown on first login.
    #[serde(default)]
    pub agreement: AgreementConfig,
    /// Configured accounts.
    #[serde(default, rename = "account")]
    pub accounts: Vec<AccountBlock>,
    /// Update files offered by client version.
    #[serde(default, rename = "update")]
    pub updates: Vec<UpdateEntry>,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        validation::validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, shown in the greeting.
    pub name: String,
    /// Protocol version announced in the greeting.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    /// Log in unknown usernames as NORMAL players.
    #[serde(default = "default_true")]
    pub allow_guests: bool,
    /// Serve Prometheus metrics on this port.
    #[serde(default)]
    pub metrics_port: Option<u16>,
    /// `"pretty"` (default) or `"json"`.
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:8200").
    pub address: SocketAddr,
    /// Longest accepted line, terminator included.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

/// Ban store backend.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BanBackend {
    /// Nothing is stored; nobody is ever banned.
    #[default]
    None,
    /// SQLite database at `bans.path`.
    Sqlite,
}

/// Ban store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BansConfig {
    #[serde(default)]
    pub backend: BanBackend,
    #[serde(default = "default_ban_path")]
    pub path: String,
}

impl Default for BansConfig {
    fn default() -> Self {
        Self {
            backend: BanBackend::None,
            path: default_ban_path(),
        }
    }
}

/// Agreement text sources. With neither set, no agreement is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgreementConfig {
    /// Rich-text rendering.
    pub rtf_path: Option<String>,
    /// Plain-text rendering, preferred by clients declaring flag `p`.
    pub plain_path: Option<String>,
}

/// One update-file advertisement.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEntry {
    /// Client version string, or `default`.
    pub version: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

pub(super) fn default_true() -> bool {
    true
}

fn default_protocol_version() -> String {
    "0.38".to_string()
}

fn default_max_line_length() -> usize {
    lobby_proto::line::DEFAULT_MAX_LINE_LEN
}

fn default_ban_path() -> String {
    "bans.db".to_string()
}
