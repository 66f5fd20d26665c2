//! Fluent builder for [`SiteConfig`] with build-time validation.

use anyhow::{Result, anyhow};
use regex::Regex;

use super::types::SiteConfig;
use super::{DEFAULT_SKIP_URL_PATTERNS, DEFAULT_USER_AGENT};
use crate::browser::BrowserPoolConfig;
use crate::stabilize::StabilizeConfig;

pub struct SiteConfigBuilder {
    max_pages: usize,
    link_crawl_max_pages: usize,
    concurrency: usize,
    chunk_size: usize,
    page_load_timeout_secs: u64,
    navigation_timeout_secs: u64,
    discovery_timeout_secs: u64,
    fetch_timeout_secs: u64,
    fetch_retries: u32,
    sitemap_max_depth: u8,
    job_timeout_secs: u64,
    path_filter: Option<String>,
    skip_url_patterns: Vec<String>,
    min_content_length: usize,
    block_assets: bool,
    extra_headers: Vec<(String, String)>,
    user_agent: String,
    browser: BrowserPoolConfig,
    stabilize: StabilizeConfig,
}

impl Default for SiteConfigBuilder {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            link_crawl_max_pages: 50,
            concurrency: 4,
            chunk_size: 50,
            page_load_timeout_secs: 30,
            navigation_timeout_secs: 30,
            discovery_timeout_secs: 30,
            fetch_timeout_secs: 10,
            fetch_retries: 2,
            sitemap_max_depth: 3,
            job_timeout_secs: 600,
            path_filter: None,
            skip_url_patterns: DEFAULT_SKIP_URL_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            min_content_length: 200,
            block_assets: true,
            extra_headers: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            browser: BrowserPoolConfig::default(),
            stabilize: StabilizeConfig::default(),
        }
    }
}

impl SiteConfigBuilder {
    #[must_use]
    pub fn max_pages(mut self, max: usize) -> Self {
        self.max_pages = max;
        self
    }

    #[must_use]
    pub fn link_crawl_max_pages(mut self, max: usize) -> Self {
        self.link_crawl_max_pages = max;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn discovery_timeout_secs(mut self, secs: u64) -> Self {
        self.discovery_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn fetch_retries(mut self, retries: u32) -> Self {
        self.fetch_retries = retries;
        self
    }

    #[must_use]
    pub fn sitemap_max_depth(mut self, depth: u8) -> Self {
        self.sitemap_max_depth = depth;
        self
    }

    #[must_use]
    pub fn job_timeout_secs(mut self, secs: u64) -> Self {
        self.job_timeout_secs = secs;
        self
    }

    /// Restrict the frontier to URLs whose path starts with `prefix`.
    #[must_use]
    pub fn path_filter(mut self, prefix: impl Into<String>) -> Self {
        self.path_filter = Some(prefix.into());
        self
    }

    /// Replace the default skip patterns entirely.
    #[must_use]
    pub fn skip_url_patterns(mut self, patterns: Vec<String>) -> Self {
        self.skip_url_patterns = patterns;
        self
    }

    /// Append a skip pattern to the current set.
    #[must_use]
    pub fn add_skip_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.skip_url_patterns.push(pattern.into());
        self
    }

    #[must_use]
    pub fn min_content_length(mut self, len: usize) -> Self {
        self.min_content_length = len;
        self
    }

    #[must_use]
    pub fn block_assets(mut self, block: bool) -> Self {
        self.block_assets = block;
        self
    }

    #[must_use]
    pub fn extra_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    #[must_use]
    pub fn browser(mut self, browser: BrowserPoolConfig) -> Self {
        self.browser = browser;
        self
    }

    #[must_use]
    pub fn stabilize(mut self, stabilize: StabilizeConfig) -> Self {
        self.stabilize = stabilize;
        self
    }

    /// Validate and build the final configuration.
    ///
    /// # Errors
    ///
    /// Fails when a skip pattern is not a valid regex, or when concurrency or
    /// chunk size is zero.
    pub fn build(self) -> Result<SiteConfig> {
        if self.concurrency == 0 {
            return Err(anyhow!("concurrency must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(anyhow!("chunk_size must be at least 1"));
        }

        let skip_url_patterns_compiled = self
            .skip_url_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| anyhow!("invalid skip pattern '{p}': {e}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(SiteConfig {
            max_pages: self.max_pages,
            link_crawl_max_pages: self.link_crawl_max_pages,
            concurrency: self.concurrency,
            chunk_size: self.chunk_size,
            page_load_timeout_secs: self.page_load_timeout_secs,
            navigation_timeout_secs: self.navigation_timeout_secs,
            discovery_timeout_secs: self.discovery_timeout_secs,
            fetch_timeout_secs: self.fetch_timeout_secs,
            fetch_retries: self.fetch_retries,
            sitemap_max_depth: self.sitemap_max_depth,
            job_timeout_secs: self.job_timeout_secs,
            path_filter: self.path_filter,
            skip_url_patterns: self.skip_url_patterns,
            skip_url_patterns_compiled,
            min_content_length: self.min_content_length,
            block_assets: self.block_assets,
            extra_headers: self.extra_headers,
            user_agent: self.user_agent,
            browser: self.browser,
            stabilize: self.stabilize,
        })
    }
}
