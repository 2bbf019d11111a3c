// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FeedError;

pub const ENV_CONFIG_PATH: &str = "SPOT_CONFIG_PATH";
pub const ENV_SHARES: &str = "SPOT_MAP_SHARES";
pub const ENV_DEBUG: &str = "DEBUG";
pub const ENV_FEED_BASE_URL: &str = "SPOT_FEED_BASE_URL";
pub const ENV_SUBMIT_URL: &str = "SPOT_SUBMIT_URL";
pub const ENV_SUBMIT_TOKEN: &str = "SPOT_SUBMIT_TOKEN";
pub const ENV_POLL_INTERVAL: &str = "SPOT_POLL_INTERVAL_SECS";

pub const DEFAULT_FEED_BASE_URL: &str = "https://api.findmespot.com";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;

/// One SPOT share to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
    #[serde(rename = "ShareId", alias = "ShareID")]
    pub share_id: String,
    #[serde(rename = "Password", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Overrides the messenger name as the feature callsign.
    #[serde(rename = "CallSign", default, skip_serializing_if = "Option::is_none")]
    pub call_sign: Option<String>,
}

impl ShareConfig {
    pub fn new(share_id: impl Into<String>) -> Self {
        Self {
            share_id: share_id.into(),
            password: None,
            call_sign: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_call_sign(mut self, call_sign: impl Into<String>) -> Self {
        self.call_sign = Some(call_sign.into());
        self
    }
}

/// Resolved input for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskConfig {
    pub shares: Vec<ShareConfig>,
    /// Log the finished collection before submitting it.
    pub debug: bool,
}

/// Validate an externally supplied `{ SPOT_MAP_SHARES, DEBUG? }` object.
pub fn resolve(value: &Value) -> Result<TaskConfig, FeedError> {
    let shares = match value.get(ENV_SHARES) {
        None | Some(Value::Null) => {
            return Err(FeedError::Config("No SPOT_MAP_SHARES Provided".into()))
        }
        // Environment variables carry the list as JSON text.
        Some(Value::String(raw)) => {
            let decoded: Value = serde_json::from_str(raw).map_err(|e| {
                FeedError::Config(format!("SPOT_MAP_SHARES is not valid JSON: {e}"))
            })?;
            resolve_shares(&decoded)?
        }
        Some(other) => resolve_shares(other)?,
    };

    let debug = match value.get(ENV_DEBUG) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => parse_flag(s),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(_) => return Err(FeedError::Config("DEBUG must be a boolean".into())),
    };

    Ok(TaskConfig { shares, debug })
}

fn resolve_shares(value: &Value) -> Result<Vec<ShareConfig>, FeedError> {
    let Value::Array(entries) = value else {
        return Err(FeedError::Config("SPOT_MAP_SHARES must be an array".into()));
    };

    let mut shares = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let mut share: ShareConfig = serde_json::from_value(entry.clone())
            .map_err(|e| FeedError::Config(format!("SPOT_MAP_SHARES[{i}]: {e}")))?;

        share.share_id = share.share_id.trim().to_string();
        if share.share_id.is_empty() {
            return Err(FeedError::Config(format!(
                "SPOT_MAP_SHARES[{i}]: ShareId must not be empty"
            )));
        }
        share.password = non_blank(share.password);
        share.call_sign = non_blank(share.call_sign);
        shares.push(share);
    }
    Ok(shares)
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load a task config file. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<TaskConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading share config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let doc = parse_document(&content, ext.as_str())
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(resolve(&doc)?)
}

/// Build the task config from `SPOT_MAP_SHARES` / `DEBUG` environment variables.
pub fn from_env() -> Result<TaskConfig> {
    let mut doc = serde_json::Map::new();
    if let Ok(raw) = std::env::var(ENV_SHARES) {
        doc.insert(ENV_SHARES.into(), Value::String(raw));
    }
    if let Ok(raw) = std::env::var(ENV_DEBUG) {
        doc.insert(ENV_DEBUG.into(), Value::String(raw));
    }
    Ok(resolve(&Value::Object(doc))?)
}

/// Load config using env var + fallbacks:
/// 1) $SPOT_CONFIG_PATH
/// 2) config/spot.toml
/// 3) config/spot.json
/// 4) SPOT_MAP_SHARES / DEBUG environment variables
pub fn load_default() -> Result<TaskConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("SPOT_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/spot.toml");
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from("config/spot.json");
    if json_p.exists() {
        return load_from(&json_p);
    }
    from_env()
}

fn parse_document(s: &str, hint_ext: &str) -> Result<Value> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[SPOT_MAP_SHARES]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str::<Value>(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported config format"))
}

fn parse_toml(s: &str) -> Result<Value> {
    let table: toml::Table = toml::from_str(s)?;
    Ok(serde_json::to_value(table)?)
}

/// Process-level knobs that are not part of the task input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub feed_base_url: String,
    /// Where to POST the collection; stdout when unset.
    pub submit_url: Option<String>,
    pub submit_token: Option<String>,
    pub poll_interval_secs: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            feed_base_url: DEFAULT_FEED_BASE_URL.to_string(),
            submit_url: None,
            submit_token: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl RuntimeSettings {
    pub fn from_env() -> Self {
        let var = |k: &str| non_blank(std::env::var(k).ok());
        let poll_interval_secs = var(ENV_POLL_INTERVAL)
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        Self {
            feed_base_url: var(ENV_FEED_BASE_URL)
                .unwrap_or_else(|| DEFAULT_FEED_BASE_URL.to_string()),
            submit_url: var(ENV_SUBMIT_URL),
            submit_token: var(ENV_SUBMIT_TOKEN),
            poll_interval_secs,
        }
    }
}
