//! Session access levels.

use serde::Deserialize;
use std::fmt;

/// Ordered access level; a command runs only when its required level is
/// at most the level the session holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Connected but not logged in.
    #[default]
    None,
    /// Ordinary logged-in player.
    Normal,
    /// Server administrator.
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Normal => "NORMAL",
            Self::Admin => "ADMIN",
        }
    }

    /// Whether a session holding `self` may run a command requiring `required`.
    #[inline]
    pub fn satisfies(self, required: AccessLevel) -> bool {
        self >= required
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
