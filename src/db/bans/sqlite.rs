//! SQLite-backed ban service.
//!
//! Mutations run in a transaction. A failed statement rolls the
//! transaction back; a failed rollback is logged and the original error
//! is returned.

use async_trait::async_trait;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, error};

use super::{BanEntry, BanService};
use crate::db::{Database, DbError};

type BanRow = (
    i64,
    Option<String>,
    Option<String>,
    Option<i64>,
    String,
    String,
    i64,
    Option<i64>,
);

const SELECT_COLUMNS: &str =
    "SELECT id, username, ip, user_id, reason, set_by, set_at, expires_at FROM bans";

fn from_row(row: BanRow) -> BanEntry {
    let (id, username, ip, user_id, reason, set_by, set_at, expires_at) = row;
    BanEntry {
        id: Some(id),
        username,
        ip,
        user_id,
        reason,
        set_by,
        set_at,
        expires_at,
    }
}

/// Durable ban store.
#[derive(Clone)]
pub struct SqliteBanService {
    pool: SqlitePool,
}

impl SqliteBanService {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    async fn finish<T>(
        tx: Transaction<'_, Sqlite>,
        result: Result<T, DbError>,
    ) -> Result<T, DbError> {
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    error!(error = %rollback, original = %e, "Failed to roll back ban transaction");
                }
                Err(e)
            }
        }
    }
}

async fn insert_ban(conn: &mut SqliteConnection, entry: &BanEntry) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO bans (username, ip, user_id, reason, set_by, set_at, expires_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.username.as_deref())
    .bind(entry.ip.as_deref())
    .bind(entry.user_id)
    .bind(entry.reason.as_str())
    .bind(entry.set_by.as_str())
    .bind(entry.set_at)
    .bind(entry.expires_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn delete_ban(conn: &mut SqliteConnection, entry: &BanEntry) -> Result<bool, DbError> {
    let result = match (entry.id, entry.username.as_deref()) {
        (Some(id), _) => {
            sqlx::query("DELETE FROM bans WHERE id = ?")
                .bind(id)
                .execute(&mut *conn)
                .await?
        }
        (None, Some(username)) => {
            let now = chrono::Utc::now().timestamp();
            sqlx::query(
                "DELETE FROM bans WHERE username = ? AND (expires_at IS NULL OR expires_at > ?)",
            )
            .bind(username)
            .bind(now)
            .execute(&mut *conn)
            .await?
        }
        (None, None) => return Ok(false),
    };
    Ok(result.rows_affected() > 0)
}

async fn merge_ban(conn: &mut SqliteConnection, entry: &BanEntry) -> Result<bool, DbError> {
    let Some(username) = entry.username.as_deref() else {
        return Ok(false);
    };
    let now = chrono::Utc::now().timestamp();

    let existing: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM bans
        WHERE username = ? AND (expires_at IS NULL OR expires_at > ?)
        ORDER BY set_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(username)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(id) = existing else {
        return Ok(false);
    };

    let result = sqlx::query(
        r#"
        UPDATE bans
        SET reason = ?, set_by = ?, set_at = ?, expires_at = ?,
            ip = COALESCE(?, ip), user_id = COALESCE(?, user_id)
        WHERE id = ?
        "#,
    )
    .bind(entry.reason.as_str())
    .bind(entry.set_by.as_str())
    .bind(entry.set_at)
    .bind(entry.expires_at)
    .bind(entry.ip.as_deref())
    .bind(entry.user_id)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    debug!(id, username, "Merged ban");
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl BanService for SqliteBanService {
    async fn size(&self) -> Result<usize, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bans")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn active_size(&self) -> Result<usize, DbError> {
        let now = chrono::Utc::now().timestamp();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bans WHERE expires_at IS NULL OR expires_at > ?",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as usize)
    }

    async fn add(&self, entry: &BanEntry) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let result = insert_ban(&mut tx, entry).await;
        Self::finish(tx, result).await
    }

    async fn remove(&self, entry: &BanEntry) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        let result = delete_ban(&mut tx, entry).await;
        Self::finish(tx, result).await
    }

    async fn find(
        &self,
        username: Option<&str>,
        ip: Option<&str>,
        user_id: Option<i64>,
    ) -> Result<Option<BanEntry>, DbError> {
        let now = chrono::Utc::now().timestamp();
        let sql = format!(
            "{SELECT_COLUMNS} WHERE (expires_at IS NULL OR expires_at > ?) \
             AND (username = ? OR ip = ? OR user_id = ?) \
             ORDER BY set_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, BanRow>(&sql)
            .bind(now)
            .bind(username)
            .bind(ip)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(from_row))
    }

    async fn merge(&self, entry: &BanEntry) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        let result = merge_ban(&mut tx, entry).await;
        Self::finish(tx, result).await
    }

    async fn list_all(&self) -> Result<Vec<BanEntry>, DbError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id");
        let rows = sqlx::query_as::<_, BanRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn list_active(&self) -> Result<Vec<BanEntry>, DbError> {
        let now = chrono::Utc::now().timestamp();
        let sql =
            format!("{SELECT_COLUMNS} WHERE expires_at IS NULL OR expires_at > ? ORDER BY id");
        let rows = sqlx::query_as::<_, BanRow>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }
}
