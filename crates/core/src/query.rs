use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::span::Span;
use crate::model::trace::TraceSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceSpansResponse {
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceListResponse {
    pub traces: Vec<TraceSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracesRequest {
    pub limit: usize,
}

impl Default for TracesRequest {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

impl TracesRequest {
    pub const MAX_LIMIT: usize = 500;

    pub fn clamped(limit: Option<usize>) -> Self {
        let limit = limit.unwrap_or(Self::default().limit).clamp(1, Self::MAX_LIMIT);
        Self { limit }
    }
}

/// Body of `POST /api/sessions`. `ttl` is a humantime string such as `12h`;
/// omitted means the server's configured default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueSessionRequest {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(default)]
    pub no_expiry: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub db_path: String,
    pub db_size_bytes: u64,
    pub traces_count: usize,
    pub users_count: usize,
    pub sessions_count: usize,
    pub newest_trace_at: Option<DateTime<Utc>>,
}
