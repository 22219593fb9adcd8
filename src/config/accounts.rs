//! Account block configuration.

use serde::Deserialize;

use crate::state::AccessLevel;

/// One `[[account]]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountBlock {
    /// Login name.
    pub name: String,
    /// Plaintext password.
    #[serde(default)]
    pub password: Option<String>,
    /// Argon2 PHC string; takes precedence over `password`.
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default = "default_access")]
    pub access: AccessLevel,
    /// Bot accounts get the bot flood threshold.
    #[serde(default)]
    pub bot: bool,
}

fn default_access() -> AccessLevel {
    AccessLevel::Normal
}
