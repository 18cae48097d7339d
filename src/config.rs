use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};

use crate::foods::cache::{CacheConfig, DEFAULT_MAX_ENTRIES};
use crate::foods::search::SearchMode;
use crate::foods::services::{SearchLimits, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};

#[derive(Debug, Clone)]
pub struct BulkConfig {
    pub database_url: String,
    pub table: String,
    /// When set, the bulk dataset is loaded from this JSON-lines dump instead of Postgres.
    pub dump_path: Option<PathBuf>,
    pub mode: SearchMode,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bulk: BulkConfig,
    pub search: SearchLimits,
    pub cache: CacheConfig,
    pub request_timeout: Duration,
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn minutes(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> anyhow::Result<Duration> {
    parse_or(lookup, key, default)
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow!("{key} is out of range"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL must be set")?;

        let mode = match lookup("FOOD_SEARCH_MODE") {
            Some(v) => SearchMode::from_str(&v).map_err(|e| anyhow!(e))?,
            None => SearchMode::default(),
        };
        let bulk = BulkConfig {
            database_url: lookup("BULK_DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| database_url.clone()),
            table: lookup("BULK_TABLE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "off_products".into()),
            dump_path: lookup("BULK_DUMP_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            mode,
        };

        let search = SearchLimits {
            default: parse_or(&lookup, "SEARCH_DEFAULT_LIMIT", DEFAULT_SEARCH_LIMIT),
            max: parse_or(&lookup, "SEARCH_MAX_LIMIT", MAX_SEARCH_LIMIT),
        };

        let max_entries = parse_or(&lookup, "BARCODE_CACHE_MAX", DEFAULT_MAX_ENTRIES as i64);
        let cache = CacheConfig {
            max_entries: usize::try_from(max_entries)
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_ENTRIES),
            positive_ttl: minutes(&lookup, "BARCODE_CACHE_TTL_MINUTES", 24 * 60)?,
            negative_ttl: minutes(&lookup, "BARCODE_CACHE_NEGATIVE_TTL_MINUTES", 30)?,
        };

        Ok(Self {
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10),
            bulk,
            search,
            cache,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10)),
        })
    }
}
