use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpyglassError};

const MAX_TRACE_ID_LEN: usize = 128;

/// Caller-supplied trace identifier. Opaque apart from basic hygiene checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TraceId(String);

/// Stable user identifier handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl TraceId {
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(SpyglassError::InvalidArgument(
                "trace id cannot be empty".to_string(),
            ));
        }
        if input.trim() != input {
            return Err(SpyglassError::InvalidArgument(
                "trace id has leading or trailing whitespace".to_string(),
            ));
        }
        if input.len() > MAX_TRACE_ID_LEN {
            return Err(SpyglassError::InvalidArgument(format!(
                "trace id longer than {MAX_TRACE_ID_LEN} bytes"
            )));
        }
        if input.chars().any(|c| c.is_ascii_control()) {
            return Err(SpyglassError::InvalidArgument(
                "trace id contains control characters".to_string(),
            ));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl UserId {
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(SpyglassError::InvalidArgument(
                "user id cannot be empty".to_string(),
            ));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TraceId {
    type Error = SpyglassError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl TryFrom<String> for UserId {
    type Error = SpyglassError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TraceId> for String {
    fn from(value: TraceId) -> Self {
        value.0
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
