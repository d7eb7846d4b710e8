use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::config::Category;
use crate::error::{PipelineError, Result};
use crate::extract::extract_rows;
use crate::sources::{SourceConfig, SourceDescriptor};
use crate::store::{ContentEntity, ContentStore};

/// Fetches the raw HTML behind a source URL.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let transport = |e: reqwest::Error| PipelineError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;
        response.text().await.map_err(transport)
    }
}

/// Per-category outcome of a scrape run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeStats {
    pub category: Category,
    pub entities: usize,
    pub ok: usize,
    pub errors: usize,
}

async fn scrape_source<F: Fetcher>(
    fetcher: &F,
    source: &SourceDescriptor,
) -> Result<Vec<ContentEntity>> {
    let html = fetcher.fetch(&source.url).await?;
    extract_rows(&html, source)
}

/// Scrape every source of one category, in order, and replace its store.
///
/// A failing source is logged and skipped; whatever the other sources
/// produced is still saved.
pub async fn scrape_category<F: Fetcher>(
    fetcher: &F,
    store: &ContentStore,
    category: &Category,
    sources: &[SourceDescriptor],
    pb: &ProgressBar,
) -> Result<ScrapeStats> {
    let mut stats = ScrapeStats {
        category: category.clone(),
        entities: 0,
        ok: 0,
        errors: 0,
    };
    let mut entities: Vec<ContentEntity> = Vec::new();

    for source in sources {
        match scrape_source(fetcher, source).await {
            Ok(rows) => {
                info!("{}: {} rows from {}", category, rows.len(), source.url);
                stats.ok += 1;
                entities.extend(rows);
            }
            Err(e) if e.is_recoverable() => {
                error!("{} source failed: {}", category, e);
                stats.errors += 1;
            }
            Err(e) => return Err(e),
        }
        pb.inc(1);
    }

    store.write(category, &entities)?;
    stats.entities = entities.len();
    Ok(stats)
}

/// Scrape all `categories` from the sources document, one source at a time.
pub async fn scrape_all<F: Fetcher>(
    fetcher: &F,
    config: &SourceConfig,
    store: &ContentStore,
    categories: &[Category],
) -> Result<Vec<ScrapeStats>> {
    for name in config.category_names() {
        if !categories.iter().any(|c| c.as_str() == name) {
            warn!("Ignoring sources for unconfigured category {:?}", name);
        }
    }

    let total: usize = categories
        .iter()
        .map(|c| config.for_category(c.as_str()).len())
        .sum();
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} sources ({msg})")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut all = Vec::with_capacity(categories.len());
    for category in categories {
        pb.set_message(category.to_string());
        let sources = config.for_category(category.as_str());
        all.push(scrape_category(fetcher, store, category, sources, &pb).await?);
    }

    pb.finish_and_clear();
    Ok(all)
}
