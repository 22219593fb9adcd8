//! Ban service that stores nothing.

use async_trait::async_trait;

use super::{BanEntry, BanService};
use crate::db::DbError;

/// Always empty; every mutation succeeds without effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBanService;

#[async_trait]
impl BanService for NoopBanService {
    async fn size(&self) -> Result<usize, DbError> {
        Ok(0)
    }

    async fn active_size(&self) -> Result<usize, DbError> {
        Ok(0)
    }

    async fn add(&self, _entry: &BanEntry) -> Result<(), DbError> {
        Ok(())
    }

    async fn remove(&self, _entry: &BanEntry) -> Result<bool, DbError> {
        Ok(true)
    }

    async fn find(
        &self,
        _username: Option<&str>,
        _ip: Option<&str>,
        _user_id: Option<i64>,
    ) -> Result<Option<BanEntry>, DbError> {
        Ok(None)
    }

    async fn merge(&self, _entry: &BanEntry) -> Result<bool, DbError> {
        Ok(true)
    }

    async fn list_all(&self) -> Result<Vec<BanEntry>, DbError> {
        Ok(Vec::new())
    }

    async fn list_active(&self) -> Result<Vec<BanEntry>, DbError> {
        Ok(Vec::new())
    }
}
