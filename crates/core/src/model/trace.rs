use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpyglassError};
use crate::ids::{TraceId, UserId};
use crate::model::span::Span;
use crate::waterfall::SpanWindow;

/// Body of an ingestion call. Unknown fields (a client-sent `userId`
/// included) are dropped on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TracePayload {
    pub trace_id: String,
    pub spans: Vec<Span>,
}

impl TracePayload {
    pub fn validate(&self) -> Result<TraceId> {
        let trace_id = TraceId::parse(&self.trace_id)?;
        validate_spans(&self.spans)?;
        Ok(trace_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredTrace {
    pub trace_id: TraceId,
    pub user_id: UserId,
    pub spans: Vec<Span>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TraceSummary {
    pub trace_id: String,
    pub span_count: usize,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub duration: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl TraceSummary {
    pub fn new(
        trace_id: String,
        span_count: usize,
        window: Option<SpanWindow>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            trace_id,
            span_count,
            start_time: window.map(|w| w.start),
            end_time: window.map(|w| w.end),
            duration: window.map(|w| w.duration()),
            created_at,
        }
    }
}

pub fn validate_spans(spans: &[Span]) -> Result<()> {
    for (idx, span) in spans.iter().enumerate() {
        if !span.start_time.is_finite() || !span.end_time.is_finite() {
            return Err(SpyglassError::InvalidArgument(format!(
                "span {idx} ({}) has a non-finite timestamp",
                span.name
            )));
        }
        if span.end_time < span.start_time {
            return Err(SpyglassError::InvalidArgument(format!(
                "span {idx} ({}) ends before it starts: {} < {}",
                span.name, span.end_time, span.start_time
            )));
        }
    }
    if let Some(window) = crate::waterfall::window(spans)
        && !window.duration().is_finite()
    {
        return Err(SpyglassError::InvalidArgument(format!(
            "trace window [{}, {}] is too wide to lay out",
            window.start, window.end
        )));
    }
    validate_parent_links(spans)
}

fn validate_parent_links(spans: &[Span]) -> Result<()> {
    let mut parents: HashMap<&str, Option<&str>> = HashMap::new();
    for span in spans {
        let Some(id) = span.span_id.as_deref() else {
            continue;
        };
        if id.is_empty() {
            return Err(SpyglassError::InvalidArgument(format!(
                "span {} has an empty spanId",
                span.name
            )));
        }
        if parents.insert(id, span.parent_span_id.as_deref()).is_some() {
            return Err(SpyglassError::InvalidArgument(format!(
                "duplicate spanId {id}"
            )));
        }
    }

    for span in spans {
        let Some(parent) = span.parent_span_id.as_deref() else {
            continue;
        };
        if span.span_id.as_deref() == Some(parent) {
            return Err(SpyglassError::InvalidArgument(format!(
                "span {parent} is its own parent"
            )));
        }
        if !parents.contains_key(parent) {
            return Err(SpyglassError::InvalidArgument(format!(
                "span {} references unknown parent {parent}",
                span.name
            )));
        }
    }

    for &start in parents.keys() {
        let mut seen = HashSet::new();
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if !seen.insert(id) {
                return Err(SpyglassError::InvalidArgument(format!(
                    "parent cycle through span {id}"
                )));
            }
            cursor = parents.get(id).copied().flatten();
        }
    }

    Ok(())
}
