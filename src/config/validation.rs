//! Configuration validation.
//!
//! Validates configuration at load time to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("flood.{0} must be greater than zero")]
    ZeroFloodParameter(&'static str),
    #[error("listen.max_line_length must be at least 64, got {0}")]
    LineLengthTooSmall(usize),
    #[error("account name is empty")]
    EmptyAccountName,
    #[error("account {0} is defined more than once")]
    DuplicateAccount(String),
    #[error("account {0} has neither password nor password_hash")]
    MissingPassword(String),
    #[error("account {0} has access level none")]
    NoAccessAccount(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if config.flood.period == 0 {
        errors.push(ValidationError::ZeroFloodParameter("period"));
    }
    if config.flood.user_threshold == 0 {
        errors.push(ValidationError::ZeroFloodParameter("user_threshold"));
    }
    if config.flood.bot_threshold == 0 {
        errors.push(ValidationError::ZeroFloodParameter("bot_threshold"));
    }

    if config.listen.max_line_length < 64 {
        errors.push(ValidationError::LineLengthTooSmall(
            config.listen.max_line_length,
        ));
    }

    let mut seen = HashSet::new();
    for account in &config.accounts {
        if account.name.trim().is_empty() {
            errors.push(ValidationError::EmptyAccountName);
            continue;
        }
        if !seen.insert(account.name.to_lowercase()) {
            errors.push(ValidationError::DuplicateAccount(account.name.clone()));
        }
        if account.password.is_none() && account.password_hash.is_none() {
            errors.push(ValidationError::MissingPassword(account.name.clone()));
        }
        if account.access == crate::state::AccessLevel::None {
            errors.push(ValidationError::NoAccessAccount(account.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    fn errors_for(extra: &str) -> Vec<String> {
        let text = format!(
            "[server]\nname = \"lobby\"\n[listen]\naddress = \"127.0.0.1:1\"\n{extra}"
        );
        match Config::parse(&text) {
            Err(ConfigError::Invalid(errors)) => errors.iter().map(ToString::to_string).collect(),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => Vec::new(),
        }
    }

    #[test]
    fn test_zero_flood_rejected() {
        let errors = errors_for("[flood]\nperiod = 0\nbot_threshold = 0\n");
        assert_eq!(
            errors,
            vec![
                "flood.period must be greater than zero",
                "flood.bot_threshold must be greater than zero"
            ]
        );
    }

    #[test]
    fn test_duplicate_and_passwordless_accounts() {
        let errors = errors_for(
            "[[account]]\nname = \"Bob\"\npassword = \"a\"\n[[account]]\nname = \"bob\"\n",
        );
        assert_eq!(
            errors,
            vec![
                "account bob is defined more than once",
                "account bob has neither password nor password_hash"
            ]
        );
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(errors_for("[[account]]\nname = \"a\"\npassword_hash = \"$argon2id$x\"\n").is_empty());
    }
}
