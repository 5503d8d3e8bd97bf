use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use duckdb::Connection;
use spyglass_core::error::{Result, SpyglassError};
use spyglass_core::query::StatusResponse;

use crate::schema::SCHEMA_SQL;

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SpyglassError::Io(format!("failed to create db dir: {e}")))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| SpyglassError::Store(format!("failed to open duckdb: {e}")))?;
        conn.execute_batch("PRAGMA threads=4;")
            .map_err(|e| SpyglassError::Store(format!("failed to set pragmas: {e}")))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| SpyglassError::Store(format!("failed to initialize schema: {e}")))?;

        tracing::debug!(path = %path.display(), "opened trace store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.display().to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SpyglassError::Store(format!("failed to open in-memory db: {e}")))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| SpyglassError::Store(format!("failed to initialize schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: ":memory:".to_string(),
        })
    }

    pub(crate) fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }

    pub fn status(&self) -> Result<StatusResponse> {
        let conn = self.conn();

        let traces_count = scalar_usize(&conn, "SELECT COUNT(*) FROM traces")?;
        let users_count = scalar_usize(&conn, "SELECT COUNT(DISTINCT user_id) FROM traces")?;
        let sessions_count = scalar_usize(&conn, "SELECT COUNT(*) FROM sessions")?;
        let newest_trace_at = conn
            .query_row("SELECT MAX(created_at) FROM traces", [], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .map_err(|e| SpyglassError::Store(format!("query failed: {e}")))?
            .and_then(millis_to_utc);

        let db_size_bytes = if self.db_path == ":memory:" {
            0
        } else {
            fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StatusResponse {
            db_path: self.db_path.clone(),
            db_size_bytes,
            traces_count,
            users_count,
            sessions_count,
            newest_trace_at,
        })
    }
}

pub(crate) fn millis_to_utc(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

fn scalar_usize(conn: &Connection, sql: &str) -> Result<usize> {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .map(|v| v as usize)
        .map_err(|e| SpyglassError::Store(format!("query failed: {e}")))
}
