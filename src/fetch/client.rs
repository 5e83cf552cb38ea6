// src/fetch/client.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::article::Article;
use crate::config::Config;
use crate::wiki::SectionInfo;

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsedSections>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ParsedSections {
    sections: Vec<SectionInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

/// Decode a MediaWiki `action=parse&prop=sections` response.
pub fn parse_sections_response(json: &str) -> Result<Vec<SectionInfo>> {
    let resp: ParseResponse = serde_json::from_str(json).context("decoding sections response")?;
    match (resp.parse, resp.error) {
        (_, Some(err)) => Err(anyhow!("mediawiki error {}: {}", err.code, err.info)),
        (Some(parsed), None) => Ok(parsed.sections),
        (None, None) => Err(anyhow!("sections response has neither parse nor error")),
    }
}

/// Thin wrapper around `reqwest` for the two Wikipedia endpoints we need.
#[derive(Debug, Clone)]
pub struct WikiClient {
    client: Client,
    config: Config,
}

impl WikiClient {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .build()
            .context("building http client")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sections_url(&self, slug: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.config.api_url,
            &[
                ("action", "parse"),
                ("page", slug),
                ("prop", "sections"),
                ("format", "json"),
                ("redirects", "1"),
            ],
        )
        .with_context(|| format!("building sections url for {}", slug))
    }

    pub fn article_url(&self, slug: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.wiki_url)
            .with_context(|| format!("parsing wiki url {}", self.config.wiki_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("wiki url {} cannot take a path", self.config.wiki_url))?
            .pop_if_empty()
            .push(slug);
        Ok(url)
    }

    async fn get_text_core(&self, url: &Url) -> Result<String> {
        debug!("Fetching text from {}", url);
        self.client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .text()
            .await
            .with_context(|| format!("Reading text from {}", url))
    }

    async fn get_text_with_retry(&self, url: &Url) -> Result<String> {
        let mut attempts = 0;
        loop {
            match self.get_text_core(url).await {
                Ok(t) => return Ok(t),
                Err(e) if attempts < self.config.max_retries => {
                    attempts += 1;
                    let backoff = backoff_delay(self.config.backoff_ms, attempts);
                    warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    error!(%url, error = %e, "Exhausted retries");
                    return Err(e);
                }
            }
        }
    }

    /// Section outline of an article.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_sections(&self, slug: &str) -> Result<Vec<SectionInfo>> {
        let url = self.sections_url(slug)?;
        let json = self.get_text_with_retry(&url).await?;
        parse_sections_response(&json).with_context(|| format!("sections of {}", slug))
    }

    /// Rendered article, keeping the heading blocks of `sections`.
    #[instrument(level = "debug", skip(self, sections))]
    pub async fn fetch_article(&self, slug: &str, sections: &[SectionInfo]) -> Result<Article> {
        let url = self.article_url(slug)?;
        let html = self.get_text_with_retry(&url).await?;
        Ok(Article::parse(
            &html,
            sections.iter().map(|s| s.anchor.as_str()),
        ))
    }
}

/// Delay before retry number `attempt` (1-based): `initial_ms` doubled per
/// earlier retry, saturating at `u64::MAX`.
fn backoff_delay(initial_ms: u64, attempt: u32) -> u64 {
    2u64
        .checked_pow(attempt.saturating_sub(1))
        .map_or(u64::MAX, |factor| initial_ms.saturating_mul(factor))
}
