//! Single-page conversion pipeline.
//!
//! The [`PageConverter`] trait is the seam between orchestration and the
//! browser: the real implementation drives Browser Pool → Page Cleaner →
//! Dynamic Content Waiter → Content Extractor → Markdown Converter, while
//! tests substitute a fake to exercise the orchestrator without Chrome.

use anyhow::{Context, Result, anyhow};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::types::PageResult;
use crate::browser::{BrowserPool, PageOptions};
use crate::cleaner;
use crate::config::SiteConfig;
use crate::error::SiteError;
use crate::extractor;
use crate::frontier::{self, FrontierEntry};
use crate::markdown::{self, ConversionOptions};
use crate::stabilize;

/// Converts single pages and discovers links from the rendered seed.
pub trait PageConverter: Send + Sync {
    /// Acquire whatever resources page conversion needs. A failure here is
    /// fatal for the whole job (no browser, no pages).
    fn prepare(&self) -> impl Future<Output = Result<(), SiteError>> + Send;

    /// Convert one URL. Never fails: every error becomes a failed
    /// [`PageResult`] so sibling conversions keep running.
    fn convert_page(
        &self,
        url: &str,
        config: &SiteConfig,
    ) -> impl Future<Output = PageResult> + Send;

    /// Render the seed page and build the link-crawl frontier (used when no
    /// sitemap exists).
    fn discover_links(
        &self,
        seed: &Url,
        config: &SiteConfig,
    ) -> impl Future<Output = Result<Vec<Vec<FrontierEntry>>>> + Send;
}

/// The production converter backed by the shared browser pool.
#[derive(Debug, Clone)]
pub struct BrowserPageConverter {
    pool: Arc<BrowserPool>,
}

impl BrowserPageConverter {
    #[must_use]
    pub fn new(pool: Arc<BrowserPool>) -> Self {
        Self { pool }
    }

    fn page_options(config: &SiteConfig) -> PageOptions {
        PageOptions {
            user_agent: Some(config.user_agent().to_string()),
            extra_headers: config.extra_headers().to_vec(),
            block_assets: config.block_assets(),
        }
    }

    /// Navigate and prepare a page: load, dismiss overlays, settle dynamic
    /// content, strip chrome.
    async fn load_and_prepare(
        &self,
        url: &Url,
        config: &SiteConfig,
    ) -> Result<crate::browser::PageGuard> {
        let guard = self
            .pool
            .acquire_page(&Self::page_options(config))
            .await
            .context("Failed to acquire page")?;

        with_page_timeout(
            async {
                guard
                    .page()
                    .goto(url.as_str())
                    .await
                    .map_err(|e| anyhow!("{e}"))
            },
            config.page_load_timeout(),
            "Page navigation",
        )
        .await?;

        with_page_timeout(
            async {
                guard
                    .page()
                    .wait_for_navigation()
                    .await
                    .map_err(|e| anyhow!("{e}"))
            },
            config.navigation_timeout(),
            "Page load",
        )
        .await?;

        if let Err(e) = cleaner::remove_overlays(guard.page()).await {
            warn!("Overlay removal failed for {url}: {e:#}");
        }

        let is_spa = cleaner::detect_spa(guard.page()).await.unwrap_or(false);
        if is_spa {
            match stabilize::wait_for_stable(guard.page(), config.stabilize()).await {
                Ok(was_dynamic) => {
                    debug!("SPA settle for {url}: dynamic={was_dynamic}");
                }
                Err(e) => warn!("Dynamic-content wait failed for {url}: {e:#}"),
            }
        }

        // Cleanup runs after settling: stripping scripts earlier would stop
        // the client-side rendering we just waited for.
        if let Err(e) = cleaner::cleanup_page(guard.page()).await {
            warn!("Page cleanup failed for {url}: {e:#}");
        }

        Ok(guard)
    }

    async fn convert_inner(&self, url: &str, config: &SiteConfig) -> Result<PageResult> {
        let parsed = Url::parse(url).with_context(|| format!("unparseable page URL {url}"))?;
        let guard = self.load_and_prepare(&parsed, config).await?;

        let extracted =
            extractor::extract(guard.page(), &parsed, config.min_content_length()).await;
        guard.close().await;
        let extracted = extracted?;

        let options = ConversionOptions {
            base_url: Some(parsed),
            attachment_prefix: None,
        };
        let content = match markdown::to_markdown(&extracted.html, &options) {
            Ok(md) => md,
            Err(e) => {
                // Conversion failure degrades to a stub document rather than
                // losing the page.
                warn!("Markdown conversion failed for {url}: {e:#}");
                markdown::fallback_document(&extracted.metadata.title, url, &format!("{e:#}"))
            }
        };

        Ok(PageResult::succeeded(
            url,
            content,
            extracted.metadata,
            extracted.images,
        ))
    }
}

impl PageConverter for BrowserPageConverter {
    async fn prepare(&self) -> Result<(), SiteError> {
        self.pool
            .warm_up()
            .await
            .map_err(|e| SiteError::BrowserLaunch(format!("{e:#}")))
    }

    async fn convert_page(&self, url: &str, config: &SiteConfig) -> PageResult {
        match self.convert_inner(url, config).await {
            Ok(result) => result,
            Err(e) => {
                debug!("Page conversion failed for {url}: {e:#}");
                PageResult::failed(url, format!("{e:#}"))
            }
        }
    }

    async fn discover_links(
        &self,
        seed: &Url,
        config: &SiteConfig,
    ) -> Result<Vec<Vec<FrontierEntry>>> {
        let guard = self.load_and_prepare(seed, config).await?;
        let chunks = frontier::find_frontier(guard.page(), seed, config).await;
        guard.close().await;
        chunks
    }
}

/// Bound a page operation with a descriptive timeout error.
pub async fn with_page_timeout<T>(
    operation: impl Future<Output = Result<T>>,
    timeout: Duration,
    what: &str,
) -> Result<T> {
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("{what} timed out after {timeout:?}")),
    }
}
