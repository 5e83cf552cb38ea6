// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const DEFAULT_WIKI_URL: &str = "https://en.wikipedia.org/wiki/";
const DEFAULT_USER_AGENT: &str = concat!("volscraper/", env!("CARGO_PKG_VERSION"));

/// Runtime settings for the fetch layer, overridable through `VOLSCRAPER_*`
/// environment variables. Missing fields take their defaults when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub wiki_url: String,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_ms: u64,
    /// Series fetched at the same time.
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            wiki_url: DEFAULT_WIKI_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: 3,
            backoff_ms: 500,
            concurrency: 3,
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("parsing {}={:?}", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from defaults, overriding each field `lookup` has a value for.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let concurrency = parsed(&lookup, "VOLSCRAPER_CONCURRENCY", defaults.concurrency)?;
        if concurrency == 0 {
            anyhow::bail!("VOLSCRAPER_CONCURRENCY must be at least 1");
        }
        Ok(Self {
            api_url: lookup("VOLSCRAPER_API_URL").unwrap_or(defaults.api_url),
            wiki_url: lookup("VOLSCRAPER_WIKI_URL").unwrap_or(defaults.wiki_url),
            user_agent: lookup("VOLSCRAPER_USER_AGENT").unwrap_or(defaults.user_agent),
            max_retries: parsed(&lookup, "VOLSCRAPER_MAX_RETRIES", defaults.max_retries)?,
            backoff_ms: parsed(&lookup, "VOLSCRAPER_BACKOFF_MS", defaults.backoff_ms)?,
            concurrency,
        })
    }
}
