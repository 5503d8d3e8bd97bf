use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{Result, SpyglassError};

pub fn parse_duration_str(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| SpyglassError::Parse(format!("invalid duration {input}: {e}")))
}

pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| SpyglassError::Parse(format!("failed to convert duration: {e}")))?;
    now.checked_add_signed(ttl)
        .ok_or_else(|| SpyglassError::InvalidArgument("expiry overflows the calendar".to_string()))
}

/// Expiry for a newly issued session. `ttl` overrides `default_ttl`;
/// `no_expiry` yields a session that never expires.
pub fn session_expiry(
    now: DateTime<Utc>,
    ttl: Option<&str>,
    no_expiry: bool,
    default_ttl: Duration,
) -> Result<Option<DateTime<Utc>>> {
    if no_expiry {
        if ttl.is_some() {
            return Err(SpyglassError::InvalidArgument(
                "ttl and no_expiry are mutually exclusive".to_string(),
            ));
        }
        return Ok(None);
    }
    let ttl = match ttl {
        Some(raw) => parse_duration_str(raw)?,
        None => default_ttl,
    };
    expiry_after(now, ttl).map(Some)
}
