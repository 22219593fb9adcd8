//! Admin command handlers.
//!
//! - FLOODLEVEL: Change flood protection parameters at runtime
//! - KICKUSER: Disconnect a user
//!
//! Access is checked by the registry; these handlers never see a
//! non-admin issuer.

mod flood;
mod kick;

pub use flood::FloodLevelHandler;
pub use kick::KickUserHandler;
