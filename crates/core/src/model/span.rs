use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One named, timestamped sub-operation of a trace.
///
/// Timestamps are plain numbers in whatever unit the instrumentation chose;
/// all spans of a trace must share that unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub name: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
}

impl Span {
    pub fn new(name: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            name: name.into(),
            start_time,
            end_time,
            attributes: Map::new(),
            span_id: None,
            parent_span_id: None,
        }
    }

    pub fn with_ids(mut self, span_id: &str, parent_span_id: Option<&str>) -> Self {
        self.span_id = Some(span_id.to_string());
        self.parent_span_id = parent_span_id.map(str::to_string);
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    pub fn is_well_formed(&self) -> bool {
        self.start_time.is_finite() && self.end_time.is_finite() && self.end_time >= self.start_time
    }
}
