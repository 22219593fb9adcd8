//! Flood protection configuration.

use serde::Deserialize;

use crate::security::FloodProtection;

/// What the connection does when a session crosses its flood threshold.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FloodAction {
    /// Reply, then close without dispatching the offending line.
    #[default]
    Disconnect,
    /// Reply with a warning and keep going.
    Warn,
}

impl FloodAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnect => "disconnect",
            Self::Warn => "warn",
        }
    }
}

/// Initial flood parameters; FLOODLEVEL changes them at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct FloodConfig {
    /// Window length in seconds.
    #[serde(default = "default_period")]
    pub period: u64,
    /// Bytes per window for ordinary accounts.
    #[serde(default = "default_user_threshold")]
    pub user_threshold: u64,
    /// Bytes per window for bot accounts.
    #[serde(default = "default_bot_threshold")]
    pub bot_threshold: u64,
    #[serde(default)]
    pub action: FloodAction,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            user_threshold: default_user_threshold(),
            bot_threshold: default_bot_threshold(),
            action: FloodAction::default(),
        }
    }
}

fn default_period() -> u64 {
    FloodProtection::DEFAULT_PERIOD_SECS
}

fn default_user_threshold() -> u64 {
    FloodProtection::DEFAULT_USER_THRESHOLD
}

fn default_bot_threshold() -> u64 {
    FloodProtection::DEFAULT_BOT_THRESHOLD
}
