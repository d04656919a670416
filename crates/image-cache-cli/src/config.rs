//! Configuration parsed from environment variables

use crate::error::{CliError, Result};
use image_cache::CacheConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the CLI's disk-backed cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub cache_dir: PathBuf,
    pub store_quota_bytes: u64,
    pub cache_ttl_secs: u64,
    pub key_prefix: String,
    pub dedupe_fetches: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache/images"),
            store_quota_bytes: 5 * 1024 * 1024, // 5MB, like browser local storage
            cache_ttl_secs: 24 * 60 * 60,       // 24 hours
            key_prefix: "img_cache_".to_string(),
            dedupe_fetches: false,
        }
    }
}

impl CliConfig {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            key_prefix: self.key_prefix.clone(),
            ttl: Duration::from_secs(self.cache_ttl_secs),
            dedupe_fetches: self.dedupe_fetches,
        }
    }
}

/// Load configuration from the process environment
pub fn load_config() -> Result<CliConfig> {
    load_config_from(|name| std::env::var(name).ok())
}

/// Load configuration from any variable source
pub fn load_config_from(var: impl Fn(&str) -> Option<String>) -> Result<CliConfig> {
    let defaults = CliConfig::default();

    let cache_dir = var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or(defaults.cache_dir);

    let store_quota_bytes = var("STORE_QUOTA_BYTES")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(defaults.store_quota_bytes);

    let cache_ttl_secs = var("CACHE_TTL_SECS")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(defaults.cache_ttl_secs);

    let key_prefix = var("CACHE_KEY_PREFIX").unwrap_or(defaults.key_prefix);

    let dedupe_fetches = var("DEDUPE_FETCHES")
        .map(|s| parse_bool(&s))
        .unwrap_or(defaults.dedupe_fetches);

    if store_quota_bytes == 0 {
        return Err(CliError::Config(
            "STORE_QUOTA_BYTES must be greater than zero".to_string(),
        ));
    }
    if cache_ttl_secs == 0 {
        return Err(CliError::Config(
            "CACHE_TTL_SECS must be greater than zero".to_string(),
        ));
    }

    Ok(CliConfig {
        cache_dir,
        store_quota_bytes,
        cache_ttl_secs,
        key_prefix,
        dedupe_fetches,
    })
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
