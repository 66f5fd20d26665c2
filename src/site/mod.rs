//! Site conversion orchestration.
//!
//! Normalizes the seed, discovers the frontier (sitemap first, link crawl as
//! fallback), converts every URL through the single-page pipeline under a
//! concurrency ceiling, and assembles the output archive. One page's failure
//! is data, not an abort; only browser launch and an invalid seed fail the
//! job.

pub mod archive;
mod page;
mod types;

pub use archive::{
    INDEX_FILE_NAME, assemble_archive, build_index, compute_stats, page_file_name,
    unique_folder_name,
};
pub use page::{BrowserPageConverter, PageConverter, with_page_timeout};
pub use types::{ArchiveFile, CrawlStats, PageResult, SiteArchive};

use chrono::Utc;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::BrowserPool;
use crate::cancel::CancelToken;
use crate::config::SiteConfig;
use crate::error::{SiteError, SiteResult};
use crate::frontier::{FrontierEntry, chunk_frontier, normalize_parsed};
use crate::sitemap::SitemapParser;

/// Top-level site conversion driver, generic over the page-conversion seam
/// so tests can substitute a fake converter.
pub struct SiteConverter<P: PageConverter> {
    config: SiteConfig,
    converter: P,
}

impl SiteConverter<BrowserPageConverter> {
    /// Production converter backed by the shared browser pool.
    #[must_use]
    pub fn new(config: SiteConfig, pool: Arc<BrowserPool>) -> Self {
        Self {
            config,
            converter: BrowserPageConverter::new(pool),
        }
    }
}

impl<P: PageConverter> SiteConverter<P> {
    #[must_use]
    pub fn with_converter(config: SiteConfig, converter: P) -> Self {
        Self { config, converter }
    }

    /// Convert the site rooted at `seed_url` into an archive.
    ///
    /// The job timeout is enforced through the cancellation token: dispatch
    /// stops, in-flight pages drain, queued pages are recorded as failed.
    pub async fn convert(&self, seed_url: &str, cancel: CancelToken) -> SiteResult<SiteArchive> {
        let seed = normalize_seed(seed_url)?;
        let seed_normalized = normalize_parsed(&seed);
        let host = seed
            .host_str()
            .map(ToString::to_string)
            .unwrap_or_else(|| seed_normalized.clone());

        self.converter.prepare().await?;

        // Job timeout as cancellation-with-cause.
        let watchdog = tokio::spawn({
            let cancel = cancel.clone();
            let timeout = self.config.job_timeout();
            async move {
                tokio::time::sleep(timeout).await;
                cancel.cancel(format!("job timeout of {timeout:?} exceeded"));
            }
        });

        let frontier = self.build_frontier(&seed, &seed_normalized, &cancel).await;
        info!(
            "Converting {} page(s) from {host} with concurrency {}",
            frontier.len(),
            self.config.concurrency()
        );

        let results = self.convert_frontier(frontier, &cancel).await;
        watchdog.abort();

        let archive = assemble_archive(
            &seed_normalized,
            &host,
            &results,
            Utc::now(),
            &HashSet::new(),
        );
        info!(
            "Archive assembled: {} converted, {} failed",
            archive.stats.successful_pages, archive.stats.failed_pages
        );
        Ok(archive)
    }

    /// Discover URLs and assemble the working frontier: seed first, then
    /// sitemap entries (or link-crawl chunks), deduplicated by normalized
    /// form and capped at the page budget.
    async fn build_frontier(
        &self,
        seed: &Url,
        seed_normalized: &str,
        cancel: &CancelToken,
    ) -> Vec<FrontierEntry> {
        let sitemap_entries = match SitemapParser::new(&self.config) {
            Ok(mut parser) => parser.discover(seed, cancel).await,
            Err(e) => {
                warn!("Sitemap parser unavailable: {e:#}");
                Vec::new()
            }
        };

        let chunks = if sitemap_entries.is_empty() {
            debug!("No usable sitemap, falling back to link discovery");
            match self.converter.discover_links(seed, &self.config).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    warn!("Link discovery failed, converting seed only: {e:#}");
                    Vec::new()
                }
            }
        } else {
            let filtered: Vec<FrontierEntry> = sitemap_entries
                .into_iter()
                .filter(|entry| {
                    let path = Url::parse(&entry.normalized)
                        .map(|u| u.path().to_string())
                        .unwrap_or_default();
                    self.config.passes_path_filter(&path)
                        && !self.config.is_url_skipped(&entry.normalized)
                })
                .collect();
            chunk_frontier(filtered, self.config.chunk_size())
        };

        // The seed is always converted, exactly once, and first.
        let mut seen = HashSet::new();
        seen.insert(seed_normalized.to_string());
        let mut frontier = vec![FrontierEntry::seed(
            seed_normalized.to_string(),
            seed.to_string(),
        )];
        for chunk in chunks {
            for entry in chunk {
                if seen.insert(entry.normalized.clone()) {
                    frontier.push(entry);
                }
            }
        }
        frontier.truncate(self.config.max_pages());
        frontier
    }

    /// Convert the frontier under the concurrency ceiling. Results are
    /// appended in completion order; the index builder regroups afterwards.
    async fn convert_frontier(
        &self,
        frontier: Vec<FrontierEntry>,
        cancel: &CancelToken,
    ) -> Vec<PageResult> {
        let mut queue: VecDeque<FrontierEntry> = frontier.into();
        let mut active = FuturesUnordered::new();
        let mut results = Vec::with_capacity(queue.len());

        loop {
            if !cancel.is_cancelled() {
                while active.len() < self.config.concurrency() {
                    let Some(entry) = queue.pop_front() else {
                        break;
                    };
                    active.push(async move {
                        debug!("Converting {}", entry.original);
                        self.converter
                            .convert_page(&entry.original, &self.config)
                            .await
                    });
                }
            }

            // In-flight conversions drain even after cancellation; each one
            // is individually bounded by the page timeouts.
            match active.next().await {
                Some(result) => results.push(result),
                None => break,
            }
        }

        if cancel.is_cancelled() && !queue.is_empty() {
            let reason = cancel
                .reason()
                .unwrap_or_else(|| "conversion cancelled".to_string());
            warn!("{} queued page(s) not attempted: {reason}", queue.len());
            for entry in queue {
                results.push(PageResult::failed(entry.original, reason.clone()));
            }
        }

        results
    }
}

/// Normalize the seed URL: enforce an HTTP(S) scheme (adding `https://` to
/// bare hosts), require a host, strip fragments and tracking parameters.
pub fn normalize_seed(input: &str) -> SiteResult<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SiteError::InvalidSeedUrl {
            url: input.to_string(),
            reason: "empty URL".to_string(),
        });
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme).map_err(|e| SiteError::InvalidSeedUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SiteError::InvalidSeedUrl {
            url: input.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none() {
        return Err(SiteError::InvalidSeedUrl {
            url: input.to_string(),
            reason: "missing host".to_string(),
        });
    }

    let canonical = normalize_parsed(&parsed);
    Url::parse(&canonical).map_err(|e| SiteError::InvalidSeedUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })
}
