//! Core configuration types for site conversion.

use serde::{Deserialize, Serialize};

use crate::browser::BrowserPoolConfig;
use crate::stabilize::StabilizeConfig;

/// Main configuration for a site conversion job.
///
/// Construct through [`SiteConfig::builder`]; the builder validates skip
/// patterns and compiles them once so frontier filtering never touches the
/// regex compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Maximum pages taken from a sitemap.
    pub(crate) max_pages: usize,
    /// Maximum pages when falling back to on-page link discovery.
    pub(crate) link_crawl_max_pages: usize,
    /// Parallel page conversions.
    pub(crate) concurrency: usize,
    /// Frontier chunk size; each chunk is priority-sorted before dispatch.
    pub(crate) chunk_size: usize,

    /// `page.goto` timeout, seconds.
    pub(crate) page_load_timeout_secs: u64,
    /// Post-navigation load-event timeout, seconds.
    pub(crate) navigation_timeout_secs: u64,
    /// Wall-clock budget for the whole sitemap discovery phase, seconds.
    pub(crate) discovery_timeout_secs: u64,
    /// Per-candidate sitemap fetch timeout, seconds.
    pub(crate) fetch_timeout_secs: u64,
    /// Retries per sitemap candidate fetch.
    pub(crate) fetch_retries: u32,
    /// Sitemap-index recursion bound.
    pub(crate) sitemap_max_depth: u8,
    /// Wall-clock budget for the entire job, seconds. Expiry yields a
    /// partial archive, not a failure.
    pub(crate) job_timeout_secs: u64,

    /// Restrict the frontier to URLs whose path starts with this prefix.
    pub(crate) path_filter: Option<String>,
    /// Raw skip patterns (kept for serialization and display).
    pub(crate) skip_url_patterns: Vec<String>,
    /// Compiled at build time from `skip_url_patterns`.
    #[serde(skip)]
    pub(crate) skip_url_patterns_compiled: Vec<regex::Regex>,

    /// Minimum cleaned text length for a selector match to count as main
    /// content.
    pub(crate) min_content_length: usize,
    /// Block image/font/media requests during navigation for speed.
    pub(crate) block_assets: bool,
    /// Extra HTTP headers applied to every page.
    pub(crate) extra_headers: Vec<(String, String)>,
    /// User agent presented to crawled sites.
    pub(crate) user_agent: String,

    pub(crate) browser: BrowserPoolConfig,
    pub(crate) stabilize: StabilizeConfig,
}

impl SiteConfig {
    #[must_use]
    pub fn builder() -> super::SiteConfigBuilder {
        super::SiteConfigBuilder::default()
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        // The default builder only fails on invalid user-supplied patterns,
        // which the defaults are not.
        match super::SiteConfigBuilder::default().build() {
            Ok(config) => config,
            Err(_) => unreachable!("default configuration is always valid"),
        }
    }
}
