//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, ListenConfig)
//! - [`flood`]: Flood protection parameters and the violation policy
//! - [`accounts`]: `[[account]]` blocks
//! - [`validation`]: Load-time checks

mod accounts;
mod flood;
mod types;
mod validation;

pub use accounts::AccountBlock;
pub use flood::{FloodAction, FloodConfig};
pub use types::{
    AgreementConfig, BanBackend, BansConfig, Config, ConfigError, ListenConfig, LogFormat,
    ServerConfig, UpdateEntry,
};
pub use validation::ValidationError;
