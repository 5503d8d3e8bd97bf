use chrono::{DateTime, Utc};
use duckdb::params;
use spyglass_core::error::{Result, SpyglassError};
use spyglass_core::ids::UserId;
use spyglass_core::query::SessionResponse;

use crate::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct IssuedSession {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<IssuedSession> for SessionResponse {
    fn from(value: IssuedSession) -> Self {
        Self {
            token: value.token,
            user_id: value.user_id.into(),
            expires_at: value.expires_at,
        }
    }
}

impl Store {
    pub fn create_session(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedSession> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
            params![
                token,
                user.as_str(),
                now.timestamp_millis(),
                expires_at.map(|t| t.timestamp_millis()),
            ],
        )
        .map_err(|e| SpyglassError::Store(format!("insert session failed: {e}")))?;

        tracing::info!(user = %user, "issued session");
        Ok(IssuedSession {
            token,
            user_id: user.clone(),
            expires_at,
        })
    }

    /// Returns whether a session with that token existed.
    pub fn revoke_session(&self, token: &str) -> Result<bool> {
        let conn = self.conn();
        let removed = conn
            .execute("DELETE FROM sessions WHERE token = ?", params![token])
            .map_err(|e| SpyglassError::Store(format!("delete session failed: {e}")))?;
        Ok(removed > 0)
    }

    /// Maps a session token to its user. Unknown and expired tokens resolve to `None`.
    pub fn resolve_session(&self, token: &str, now: DateTime<Utc>) -> Result<Option<UserId>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .map_err(|e| SpyglassError::Store(format!("prepare session lookup failed: {e}")))?;
        let mut rows = stmt
            .query_map(params![token], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?))
            })
            .map_err(|e| SpyglassError::Store(format!("query session failed: {e}")))?;

        let Some(row) = rows.next() else {
            return Ok(None);
        };
        let (user_id, expires_at) =
            row.map_err(|e| SpyglassError::Store(format!("map session row failed: {e}")))?;

        if let Some(expires_at) = expires_at
            && expires_at <= now.timestamp_millis()
        {
            return Ok(None);
        }
        UserId::parse(&user_id).map(Some)
    }
}
