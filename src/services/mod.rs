//! Collaborators the lobby consults through narrow interfaces.
//!
//! - [`accounts`]: credential checks against configured accounts
//! - [`agreement`]: agreement text and per-account acceptance
//! - [`updates`]: update-file offers keyed by client version

pub mod accounts;
pub mod agreement;
pub mod updates;

pub use accounts::{AccountStore, Authenticated};
pub use agreement::Agreement;
pub use updates::UpdateCatalog;
