use duckdb::params;
use spyglass_core::error::{Result, SpyglassError};
use spyglass_core::ids::{TraceId, UserId};
use spyglass_core::model::span::Span;
use spyglass_core::model::trace::{StoredTrace, TraceSummary};
use spyglass_core::query::TracesRequest;
use spyglass_core::waterfall::SpanWindow;

use crate::Store;
use crate::db::millis_to_utc;

impl Store {
    /// Reads a trace owned by `user`. Traces owned by anyone else are
    /// reported exactly like missing ones.
    pub fn get_trace(&self, user: &UserId, trace_id: &TraceId) -> Result<Option<StoredTrace>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT spans_json, created_at FROM traces
                 WHERE user_id = ? AND trace_id = ?",
            )
            .map_err(|e| SpyglassError::Store(format!("prepare trace fetch failed: {e}")))?;

        let mut rows = stmt
            .query_map(params![user.as_str(), trace_id.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| SpyglassError::Store(format!("query trace failed: {e}")))?;

        let Some(row) = rows.next() else {
            return Ok(None);
        };
        let (spans_json, created_at) =
            row.map_err(|e| SpyglassError::Store(format!("map trace row failed: {e}")))?;

        let spans: Vec<Span> = serde_json::from_str(&spans_json).map_err(|e| {
            SpyglassError::Store(format!("stored spans for {trace_id} are corrupt: {e}"))
        })?;
        let created_at = millis_to_utc(created_at).ok_or_else(|| {
            SpyglassError::Store(format!("stored timestamp out of range: {created_at}"))
        })?;

        Ok(Some(StoredTrace {
            trace_id: trace_id.clone(),
            user_id: user.clone(),
            spans,
            created_at,
        }))
    }

    /// Newest-first listing of `user`'s traces.
    pub fn list_traces(&self, user: &UserId, req: &TracesRequest) -> Result<Vec<TraceSummary>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT trace_id, span_count, window_start, window_end, created_at
                 FROM traces
                 WHERE user_id = ?
                 ORDER BY created_at DESC, trace_id ASC
                 LIMIT ?",
            )
            .map_err(|e| SpyglassError::Store(format!("prepare traces failed: {e}")))?;

        let rows = stmt
            .query_map(params![user.as_str(), req.limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .map_err(|e| SpyglassError::Store(format!("query traces failed: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let (trace_id, span_count, start, end, created_at) =
                row.map_err(|e| SpyglassError::Store(format!("map traces row failed: {e}")))?;
            let window = match (start, end) {
                (Some(start), Some(end)) => Some(SpanWindow { start, end }),
                _ => None,
            };
            let created_at = millis_to_utc(created_at).ok_or_else(|| {
                SpyglassError::Store(format!("stored timestamp out of range: {created_at}"))
            })?;
            out.push(TraceSummary::new(
                trace_id,
                span_count.max(0) as usize,
                window,
                created_at,
            ));
        }
        Ok(out)
    }
}
