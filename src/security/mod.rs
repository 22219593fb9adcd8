//! Security module for lobbyd.
//!
//! - **Flood protection**: per-session byte windows with runtime-tunable thresholds
//! - **Passwords**: Argon2 verification and constant-time plaintext comparison

pub mod flood;
pub mod password;

pub use flood::{FloodParameter, FloodProtection, FloodVerdict, FloodWindow};
