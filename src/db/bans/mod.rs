//! Ban storage.
//!
//! The lobby talks to bans only through [`BanService`]. Two backends exist:
//! [`NoopBanService`] (nothing stored, nobody banned) and
//! [`SqliteBanService`] (durable, transactional mutations).

mod models;
mod noop;
mod sqlite;

pub use models::BanEntry;
pub use noop::NoopBanService;
pub use sqlite::SqliteBanService;

use async_trait::async_trait;

use super::DbError;

/// Pluggable ban store.
#[async_trait]
pub trait BanService: Send + Sync {
    /// Number of stored bans, expired ones included.
    async fn size(&self) -> Result<usize, DbError>;

    /// Number of bans currently in force.
    async fn active_size(&self) -> Result<usize, DbError>;

    /// Store a new ban.
    async fn add(&self, entry: &BanEntry) -> Result<(), DbError>;

    /// Remove a ban, by row id when known, else every active ban on its username.
    async fn remove(&self, entry: &BanEntry) -> Result<bool, DbError>;

    /// Active ban matching any of the given identities.
    async fn find(
        &self,
        username: Option<&str>,
        ip: Option<&str>,
        user_id: Option<i64>,
    ) -> Result<Option<BanEntry>, DbError>;

    /// Fold `entry` into the active ban on the same username.
    /// Returns `false` when there is none to merge into.
    async fn merge(&self, entry: &BanEntry) -> Result<bool, DbError>;

    async fn list_all(&self) -> Result<Vec<BanEntry>, DbError>;

    async fn list_active(&self) -> Result<Vec<BanEntry>, DbError>;
}
