use chrono::{DateTime, Utc};
use duckdb::params;
use spyglass_core::error::{Result, SpyglassError};
use spyglass_core::ids::{TraceId, UserId};
use spyglass_core::model::span::Span;
use spyglass_core::waterfall;

use crate::Store;

impl Store {
    /// Persists one trace for `user`. A second insert of the same
    /// `(user, trace_id)` fails with `Conflict` and leaves the first untouched.
    pub fn insert_trace(
        &self,
        user: &UserId,
        trace_id: &TraceId,
        spans: &[Span],
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let spans_json = serde_json::to_string(spans)
            .map_err(|e| SpyglassError::Internal(format!("encode spans failed: {e}")))?;
        let window = waterfall::window(spans);

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| SpyglassError::Store(format!("begin tx failed: {e}")))?;

        let existing = tx
            .query_row(
                "SELECT COUNT(*) FROM traces WHERE user_id = ? AND trace_id = ?",
                params![user.as_str(), trace_id.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|e| SpyglassError::Store(format!("duplicate check failed: {e}")))?;
        if existing > 0 {
            return Err(SpyglassError::Conflict(format!(
                "trace {trace_id} already exists"
            )));
        }

        tx.execute(
            "INSERT INTO traces
             (user_id, trace_id, spans_json, span_count, window_start, window_end, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                user.as_str(),
                trace_id.as_str(),
                spans_json,
                spans.len() as i64,
                window.map(|w| w.start),
                window.map(|w| w.end),
                created_at.timestamp_millis(),
            ],
        )
        .map_err(|e| SpyglassError::Store(format!("insert trace failed: {e}")))?;

        tx.commit()
            .map_err(|e| SpyglassError::Store(format!("commit trace failed: {e}")))
    }
}
