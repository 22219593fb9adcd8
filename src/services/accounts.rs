//! Account lookup and authentication.
//!
//! Accounts come from `[[account]]` config blocks. When guests are allowed,
//! any valid username that is not a configured account logs in as NORMAL.

use std::collections::HashMap;

use tracing::warn;

use crate::config::AccountBlock;
use crate::security::password;
use crate::state::AccessLevel;

const MAX_USERNAME_LEN: usize = 20;

#[derive(Debug, Clone)]
enum Credential {
    Plain(String),
    Hash(String),
}

#[derive(Debug, Clone)]
struct Account {
    name: String,
    credential: Credential,
    access: AccessLevel,
    bot: bool,
}

/// A successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// Canonical name (configured casing for accounts).
    pub name: String,
    pub access: AccessLevel,
    pub bot: bool,
}

/// Configured accounts, keyed by lowercased name.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: HashMap<String, Account>,
    allow_guests: bool,
}

/// Usernames are 1-20 characters of `[A-Za-z0-9_\[\]]`.
pub fn is_valid_username(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_USERNAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '[' | ']'))
}

impl AccountStore {
    pub fn from_config(blocks: &[AccountBlock], allow_guests: bool) -> Self {
        let accounts = blocks
            .iter()
            .filter_map(|block| {
                let credential = match (&block.password_hash, &block.password) {
                    (Some(hash), _) => Credential::Hash(hash.clone()),
                    (None, Some(plain)) => Credential::Plain(plain.clone()),
                    (None, None) => return None,
                };
                Some((
                    block.name.to_lowercase(),
                    Account {
                        name: block.name.clone(),
                        credential,
                        access: block.access,
                        bot: block.bot,
                    },
                ))
            })
            .collect();
        Self {
            accounts,
            allow_guests,
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Check credentials. `None` means "bad username/password".
    pub fn authenticate(&self, username: &str, supplied: &str) -> Option<Authenticated> {
        if !is_valid_username(username) {
            return None;
        }

        let Some(account) = self.accounts.get(&username.to_lowercase()) else {
            return self.allow_guests.then(|| Authenticated {
                name: username.to_string(),
                access: AccessLevel::Normal,
                bot: false,
            });
        };

        let ok = match &account.credential {
            Credential::Plain(configured) => password::plaintext_matches(supplied, configured),
            Credential::Hash(hash) => match password::verify_password(supplied, hash) {
                Ok(ok) => ok,
                Err(e) => {
                    warn!(account = %account.name, error = %e, "Malformed password hash in config");
                    false
                }
            },
        };

        ok.then(|| Authenticated {
            name: account.name.clone(),
            access: account.access,
            bot: account.bot,
        })
    }
}
