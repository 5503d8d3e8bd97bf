//! Proportional time-offset layout for a trace's spans.
//!
//! Every bar is positioned relative to the trace window, i.e. the earliest
//! span start up to the latest span end, never to an absolute clock.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpyglassError};
use crate::model::span::Span;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpanWindow {
    pub start: f64,
    pub end: f64,
}

impl SpanWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BarOrder {
    /// Same order as the spans were received.
    #[default]
    Received,
    /// Stable sort by span start time.
    StartTime,
}

impl FromStr for BarOrder {
    type Err = SpyglassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "received" | "original" => Ok(Self::Received),
            "start" | "start_time" => Ok(Self::StartTime),
            _ => Err(SpyglassError::Parse(format!("unknown bar order: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallBar {
    pub index: usize,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    pub depth: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub offset_percent: f64,
    pub width_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Waterfall {
    pub window: Option<SpanWindow>,
    pub bars: Vec<WaterfallBar>,
}

impl Waterfall {
    pub fn total_duration(&self) -> f64 {
        self.window.map(|w| w.duration()).unwrap_or(0.0)
    }
}

/// Earliest start and latest end across `spans`; `None` for an empty list.
pub fn window(spans: &[Span]) -> Option<SpanWindow> {
    let mut iter = spans.iter();
    let first = iter.next()?;
    let mut out = SpanWindow {
        start: first.start_time,
        end: first.end_time,
    };
    for span in iter {
        out.start = out.start.min(span.start_time);
        out.end = out.end.max(span.end_time);
    }
    Some(out)
}

pub fn layout(spans: &[Span], order: BarOrder) -> Result<Waterfall> {
    if let Some((idx, span)) = spans.iter().enumerate().find(|(_, s)| !s.is_well_formed()) {
        return Err(SpyglassError::InvalidArgument(format!(
            "span {idx} ({}) has malformed timestamps: start={} end={}",
            span.name, span.start_time, span.end_time
        )));
    }

    let Some(window) = window(spans) else {
        return Ok(Waterfall {
            window: None,
            bars: Vec::new(),
        });
    };

    let total = window.duration();
    if !total.is_finite() {
        return Err(SpyglassError::InvalidArgument(format!(
            "trace window [{}, {}] is too wide to lay out",
            window.start, window.end
        )));
    }

    let depths = depths(spans);
    let mut bars = spans
        .iter()
        .enumerate()
        .map(|(index, span)| {
            let (offset_percent, width_percent) = if total == 0.0 {
                (0.0, 100.0)
            } else {
                let offset = (span.start_time - window.start) / total * 100.0;
                let width = (span.end_time - span.start_time) / total * 100.0;
                (offset, width.min(100.0 - offset))
            };
            WaterfallBar {
                index,
                name: span.name.clone(),
                span_id: span.span_id.clone(),
                depth: depths[index],
                start_time: span.start_time,
                end_time: span.end_time,
                offset_percent,
                width_percent,
            }
        })
        .collect::<Vec<_>>();

    if order == BarOrder::StartTime {
        bars.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    }

    Ok(Waterfall {
        window: Some(window),
        bars,
    })
}

// Ancestor count per span. Dangling parents and flat spans sit at depth 0;
// the walk is bounded by the span count so a cyclic input cannot hang.
fn depths(spans: &[Span]) -> Vec<usize> {
    let known: HashSet<&str> = spans.iter().filter_map(|s| s.span_id.as_deref()).collect();
    let parents: HashMap<&str, &str> = spans
        .iter()
        .filter_map(|s| Some((s.span_id.as_deref()?, s.parent_span_id.as_deref()?)))
        .collect();

    spans
        .iter()
        .map(|span| {
            let mut depth = 0;
            let mut cursor = span.parent_span_id.as_deref();
            while let Some(parent) = cursor {
                if depth >= spans.len() || !known.contains(parent) {
                    break;
                }
                depth += 1;
                cursor = parents.get(parent).copied();
            }
            depth
        })
        .collect()
}
