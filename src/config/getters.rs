//! Read accessors for [`SiteConfig`].

use std::time::Duration;

use super::types::SiteConfig;
use crate::browser::BrowserPoolConfig;
use crate::stabilize::StabilizeConfig;

impl SiteConfig {
    #[must_use]
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    #[must_use]
    pub fn link_crawl_max_pages(&self) -> usize {
        self.link_crawl_max_pages
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub fn fetch_retries(&self) -> u32 {
        self.fetch_retries
    }

    #[must_use]
    pub fn sitemap_max_depth(&self) -> u8 {
        self.sitemap_max_depth
    }

    #[must_use]
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    #[must_use]
    pub fn path_filter(&self) -> Option<&str> {
        self.path_filter.as_deref()
    }

    #[must_use]
    pub fn min_content_length(&self) -> usize {
        self.min_content_length
    }

    #[must_use]
    pub fn block_assets(&self) -> bool {
        self.block_assets
    }

    #[must_use]
    pub fn extra_headers(&self) -> &[(String, String)] {
        &self.extra_headers
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn browser(&self) -> &BrowserPoolConfig {
        &self.browser
    }

    #[must_use]
    pub fn stabilize(&self) -> &StabilizeConfig {
        &self.stabilize
    }

    /// Whether a URL matches any compiled skip pattern.
    #[must_use]
    pub fn is_url_skipped(&self, url: &str) -> bool {
        self.skip_url_patterns_compiled
            .iter()
            .any(|re| re.is_match(url))
    }

    /// Whether a path passes the optional path-prefix filter.
    #[must_use]
    pub fn passes_path_filter(&self, path: &str) -> bool {
        match &self.path_filter {
            Some(prefix) => path.starts_with(prefix.as_str()),
            None => true,
        }
    }
}
