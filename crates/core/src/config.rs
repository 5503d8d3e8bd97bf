use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpyglassError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub http_addr: String,
    pub session_cookie: String,
    pub session_ttl: Duration,
    pub max_body_bytes: usize,
    pub cors_allow_any: bool,
    /// Enables the session admin endpoints when set.
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let data_root = env::var("XDG_DATA_HOME")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(home).join(".local/share"));

        Self {
            db_path: data_root.join("spyglass/spyglass.duckdb"),
            http_addr: "127.0.0.1:4380".to_string(),
            session_cookie: "spyglass.session-token".to_string(),
            session_ttl: Duration::from_secs(60 * 60 * 24 * 30),
            max_body_bytes: 2 * 1024 * 1024,
            cors_allow_any: false,
            admin_token: None,
        }
    }
}

impl Config {
    /// Defaults, then the config file, then `SPYGLASS_*` environment variables.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    db_path: Option<PathBuf>,
    http_addr: Option<String>,
    session_cookie: Option<String>,
    session_ttl: Option<String>,
    max_body_bytes: Option<usize>,
    cors_allow_any: Option<bool>,
    admin_token: Option<String>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("SPYGLASS_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("spyglass/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| SpyglassError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| SpyglassError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<ConfigOverrides> {
    let max_body_bytes = match env::var("SPYGLASS_MAX_BODY_BYTES") {
        Ok(v) => Some(v.parse::<usize>().map_err(|e| {
            SpyglassError::Config(format!("bad SPYGLASS_MAX_BODY_BYTES in environment: {e}"))
        })?),
        Err(_) => None,
    };
    let cors_allow_any = match env::var("SPYGLASS_CORS_ALLOW_ANY") {
        Ok(v) => Some(parse_bool(&v).ok_or_else(|| {
            SpyglassError::Config(format!("bad SPYGLASS_CORS_ALLOW_ANY in environment: {v}"))
        })?),
        Err(_) => None,
    };

    Ok(ConfigOverrides {
        db_path: env::var("SPYGLASS_DB_PATH").ok().map(PathBuf::from),
        http_addr: env::var("SPYGLASS_HTTP_ADDR").ok(),
        session_cookie: env::var("SPYGLASS_SESSION_COOKIE").ok(),
        session_ttl: env::var("SPYGLASS_SESSION_TTL").ok(),
        max_body_bytes,
        cors_allow_any,
        admin_token: env::var("SPYGLASS_ADMIN_TOKEN").ok(),
    })
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.db_path {
        cfg.db_path = v;
    }
    if let Some(v) = overrides.http_addr {
        cfg.http_addr = v;
    }
    if let Some(v) = overrides.session_cookie {
        if v.trim().is_empty() {
            return Err(SpyglassError::Config(format!(
                "session_cookie in {source} cannot be empty"
            )));
        }
        cfg.session_cookie = v;
    }
    if let Some(v) = overrides.session_ttl {
        cfg.session_ttl = humantime::parse_duration(&v).map_err(|e| {
            SpyglassError::Config(format!("bad session_ttl in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.max_body_bytes {
        cfg.max_body_bytes = v;
    }
    if let Some(v) = overrides.cors_allow_any {
        cfg.cors_allow_any = v;
    }
    if let Some(v) = overrides.admin_token {
        if v.trim().is_empty() {
            return Err(SpyglassError::Config(format!(
                "admin_token in {source} cannot be empty"
            )));
        }
        cfg.admin_token = Some(v);
    }
    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
