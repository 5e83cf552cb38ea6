// src/fetch/mod.rs

pub mod article;
pub mod client;

use anyhow::{Context, Result};
use futures::{stream::FuturesUnordered, StreamExt};
use serde::Serialize;
use tracing::{info, instrument};

pub use article::Article;
pub use client::WikiClient;

use crate::wiki::{extract_volumes, VolumeInfo, VolumeOptions};

/// Article slug for a series title, e.g. `Sword Art Online` → `Sword_Art_Online`.
pub fn default_slug(series: &str) -> String {
    series.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Fetch one series' article and extract its volumes.
///
/// Returns the volumes in ascending order along with how many there are.
#[instrument(level = "info", skip(client))]
pub async fn get_volume_info(
    client: &WikiClient,
    series: &str,
    options: &VolumeOptions,
) -> Result<(Vec<VolumeInfo>, usize)> {
    let slug = options
        .slug_override
        .clone()
        .unwrap_or_else(|| default_slug(series));

    let sections = client.fetch_sections(&slug).await?;
    let article = client.fetch_article(&slug, &sections).await?;
    let volumes = extract_volumes(
        series,
        &article,
        &sections,
        options.tables_to_parse_override,
    )
    .with_context(|| format!("extracting volumes for {} ({})", series, slug))?;

    let count = volumes.len();
    Ok((volumes, count))
}

/// One series to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub series: String,
    pub options: VolumeOptions,
}

impl SeriesRequest {
    pub fn new(series: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            options: VolumeOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesReport {
    pub series: String,
    pub count: usize,
    pub volumes: Vec<VolumeInfo>,
}

/// Look up every request, at most `Config::concurrency` at a time.
///
/// Results come back in request order; one failing series does not stop the
/// others.
pub async fn fetch_all(
    client: &WikiClient,
    requests: &[SeriesRequest],
) -> Vec<Result<SeriesReport>> {
    let max_concurrency = client.config().concurrency.max(1);
    let mut tasks = FuturesUnordered::new();
    let mut results: Vec<Option<Result<SeriesReport>>> =
        requests.iter().map(|_| None).collect();

    for (idx, req) in requests.iter().enumerate() {
        tasks.push(async move {
            let res = get_volume_info(client, &req.series, &req.options)
                .await
                .map(|(volumes, count)| SeriesReport {
                    series: req.series.clone(),
                    count,
                    volumes,
                });
            (idx, res)
        });

        // throttle concurrency
        if tasks.len() >= max_concurrency {
            if let Some((done, res)) = tasks.next().await {
                results[done] = Some(res);
            }
        }
    }

    // drain remaining tasks
    while let Some((done, res)) = tasks.next().await {
        results[done] = Some(res);
    }

    info!(series = requests.len(), "all lookups finished");
    results
        .into_iter()
        .map(|res| res.unwrap_or_else(|| Err(anyhow::anyhow!("lookup never completed"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn slug_joins_words_with_underscores() {
        assert_eq!(default_slug("Sword Art Online"), "Sword_Art_Online");
        assert_eq!(default_slug("  Overlord  "), "Overlord");
        assert_eq!(default_slug("Re:Zero"), "Re:Zero");
    }

    #[tokio::test]
    async fn fetch_all_keeps_request_order_and_failures() {
        let client = WikiClient::new(Config {
            api_url: "http://127.0.0.1:9/api.php".into(),
            max_retries: 0,
            concurrency: 2,
            ..Config::default()
        })
        .unwrap();
        let requests = vec![
            SeriesRequest::new("A"),
            SeriesRequest::new("B"),
            SeriesRequest::new("C"),
        ];
        let results = fetch_all(&client, &requests).await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_err()));
    }
}
