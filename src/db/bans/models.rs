//! Ban entry model.

/// A ban record. Any of username, ip and user id may identify the banned party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanEntry {
    /// Row id, once stored.
    pub id: Option<i64>,
    pub username: Option<String>,
    pub ip: Option<String>,
    pub user_id: Option<i64>,
    /// Reason for the ban.
    pub reason: String,
    /// Admin who set the ban.
    pub set_by: String,
    /// Unix timestamp when the ban was set.
    pub set_at: i64,
    /// Optional expiration timestamp; `None` is permanent.
    pub expires_at: Option<i64>,
}

impl BanEntry {
    /// A username ban set now. A duration of zero, or one running past the
    /// end of the timestamp range, is permanent.
    pub fn for_username(username: &str, duration_secs: i64, reason: &str, set_by: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            username: Some(username.to_string()),
            ip: None,
            user_id: None,
            reason: reason.to_string(),
            set_by: set_by.to_string(),
            set_at: now,
            expires_at: if duration_secs > 0 {
                now.checked_add(duration_secs)
            } else {
                None
            },
        }
    }

    pub fn is_active_at(&self, now: i64) -> bool {
        self.expires_at.is_none_or(|expires| expires > now)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(chrono::Utc::now().timestamp())
    }

    /// Whether this entry names the given identity.
    pub fn matches(&self, username: Option<&str>, ip: Option<&str>, user_id: Option<i64>) -> bool {
        let by_name = matches!(
            (self.username.as_deref(), username),
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b)
        );
        let by_ip = matches!((self.ip.as_deref(), ip), (Some(a), Some(b)) if a == b);
        let by_id = matches!((self.user_id, user_id), (Some(a), Some(b)) if a == b);
        by_name || by_ip || by_id
    }

    /// `BANLISTENTRY` line for admins.
    pub fn list_line(&self) -> String {
        let expires = self
            .expires_at
            .map_or_else(|| "never".to_string(), |t| t.to_string());
        format!(
            "BANLISTENTRY {} {} {} {} {} {}",
            self.username.as_deref().unwrap_or("*"),
            self.ip.as_deref().unwrap_or("*"),
            self.user_id.map_or_else(|| "*".to_string(), |id| id.to_string()),
            expires,
            self.set_by,
            self.reason
        )
    }
}
