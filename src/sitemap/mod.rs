//! Sitemap discovery.
//!
//! Probes robots.txt `Sitemap:` directives and the conventional locations in
//! order, stopping at the first candidate that yields at least one URL.
//! Index documents expand recursively up to a bounded depth; gzip payloads
//! are decompressed; the whole phase runs under its own wall-clock timeout
//! and returns whatever was collected when it expires.

mod parse;
mod robots;

pub use parse::{DEFAULT_PRIORITY, ParsedSitemap, SitemapRecord, parse_sitemap};
pub use robots::sitemap_urls_from_robots;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::io::Read;
use tracing::{debug, warn};
use url::Url;

use crate::cancel::CancelToken;
use crate::config::SiteConfig;
use crate::frontier::{FrontierEntry, Provenance, normalize_url};

/// Conventional sitemap locations probed before robots-declared ones.
pub const CONVENTIONAL_SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap.xml.gz",
    "/sitemap/sitemap.xml",
    "/sitemaps/sitemap.xml",
];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Sitemap discovery over one site. `loc` values are deduplicated across the
/// whole parser lifetime, so re-running discovery cannot re-emit a URL.
pub struct SitemapParser {
    http: reqwest::Client,
    config: SiteConfig,
    /// `loc` dedup across the parser lifetime.
    seen_locs: HashSet<String>,
    /// Sitemap documents already expanded; breaks index cycles.
    visited_sitemaps: HashSet<String>,
    /// Records from the currently winning candidate.
    collected: Vec<SitemapRecord>,
}

impl SitemapParser {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(config.user_agent().to_string())
            .build()
            .context("Failed to build sitemap HTTP client")?;
        Ok(Self {
            http,
            config: config.clone(),
            seen_locs: HashSet::new(),
            visited_sitemaps: HashSet::new(),
            collected: Vec::new(),
        })
    }

    /// Discover the site's URL set.
    ///
    /// Empty result means "no usable sitemap"; the orchestrator then falls
    /// back to link crawling. Candidate failures are logged, never fatal.
    pub async fn discover(&mut self, base: &Url, cancel: &CancelToken) -> Vec<FrontierEntry> {
        let deadline = self.config.discovery_timeout();
        let timed_out = tokio::time::timeout(deadline, self.discover_inner(base, cancel))
            .await
            .is_err();
        if timed_out {
            warn!(
                "Sitemap discovery timed out after {deadline:?}, returning {} collected URL(s)",
                self.collected.len()
            );
        }

        let records = std::mem::take(&mut self.collected);
        let mut entries = Vec::with_capacity(records.len());
        let mut seen_normalized: HashSet<String> = HashSet::new();
        for record in records {
            let Some(normalized) = normalize_url(&record.loc) else {
                continue;
            };
            if !seen_normalized.insert(normalized.clone()) {
                continue;
            }
            entries.push(FrontierEntry {
                normalized,
                original: record.loc,
                provenance: Provenance::Sitemap {
                    lastmod: record.lastmod,
                    priority: record.priority,
                    changefreq: record.changefreq,
                },
            });
            if entries.len() >= self.config.max_pages() {
                break;
            }
        }
        entries
    }

    async fn discover_inner(&mut self, base: &Url, cancel: &CancelToken) {
        let robots_declared = self.robots_sitemaps(base, cancel).await;

        let mut candidates: Vec<String> = Vec::new();
        for path in CONVENTIONAL_SITEMAP_PATHS {
            if let Ok(url) = base.join(path) {
                candidates.push(url.to_string());
            }
        }
        candidates.extend(robots_declared);
        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(c.clone()));

        for candidate in candidates {
            if cancel.is_cancelled() {
                return;
            }
            self.collected.clear();
            self.visited_sitemaps.clear();
            self.expand(candidate.clone(), 0, cancel).await;
            if !self.collected.is_empty() {
                debug!(
                    "Sitemap candidate {candidate} yielded {} URL(s)",
                    self.collected.len()
                );
                // First successful candidate wins; later ones are never
                // consulted.
                return;
            }
        }
    }

    async fn robots_sitemaps(&self, base: &Url, cancel: &CancelToken) -> Vec<String> {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        let Ok(robots_url) = base.join("/robots.txt") else {
            return Vec::new();
        };
        match self.fetch_with_retries(robots_url.as_str()).await {
            Ok(body) => {
                let text = String::from_utf8_lossy(&body);
                let declared = sitemap_urls_from_robots(&text);
                debug!("robots.txt declared {} sitemap(s)", declared.len());
                declared
            }
            Err(e) => {
                debug!("robots.txt unavailable: {e:#}");
                Vec::new()
            }
        }
    }

    /// Fetch and parse one sitemap document, recursing into index children.
    ///
    /// Boxed return type because the recursion through index documents makes
    /// the future self-referential otherwise.
    fn expand<'a>(
        &'a mut self,
        location: String,
        depth: u8,
        cancel: &'a CancelToken,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return;
            }
            if !self.visited_sitemaps.insert(location.clone()) {
                debug!("Skipping already-visited sitemap {location}");
                return;
            }

            let body = match self.fetch_with_retries(&location).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!("Sitemap candidate {location} unreachable: {e:#}");
                    return;
                }
            };

            let text = match decompress_if_gzip(&location, &body) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to decode sitemap {location}: {e:#}");
                    return;
                }
            };

            match parse_sitemap(&text) {
                Ok(ParsedSitemap::UrlSet(records)) => {
                    for record in records {
                        if self.seen_locs.insert(record.loc.clone()) {
                            self.collected.push(record);
                        }
                        if self.collected.len() >= self.config.max_pages() {
                            return;
                        }
                    }
                }
                Ok(ParsedSitemap::Index(children)) => {
                    if depth >= self.config.sitemap_max_depth() {
                        warn!(
                            "Sitemap index nesting exceeds depth {}, stopping at {location}",
                            self.config.sitemap_max_depth()
                        );
                        return;
                    }
                    for child in children {
                        if self.collected.len() >= self.config.max_pages() {
                            return;
                        }
                        self.expand(child, depth + 1, cancel).await;
                    }
                }
                Err(e) => {
                    debug!("Sitemap candidate {location} unparseable: {e:#}");
                }
            }
        })
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<Vec<u8>> {
        let attempts = self.config.fetch_retries() + 1;
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.fetch_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    debug!("Fetch attempt {attempt}/{attempts} for {url} failed: {e:#}");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no fetch attempts made")))
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        if !response.status().is_success() {
            anyhow::bail!("{url} returned HTTP {}", response.status());
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {url} failed"))?;
        Ok(bytes.to_vec())
    }
}

/// Decompress gzip payloads. The `.gz` extension and `Content-Encoding` are
/// only hints; the magic bytes decide, since some servers serve `.gz` paths
/// pre-decompressed.
fn decompress_if_gzip(location: &str, body: &[u8]) -> Result<String> {
    if body.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(body);
        let mut text = String::new();
        decoder
            .read_to_string(&mut text)
            .with_context(|| format!("gzip decompression of {location} failed"))?;
        return Ok(text);
    }
    Ok(String::from_utf8_lossy(body).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_roundtrip() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"https://example.com/a\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let text = decompress_if_gzip("https://example.com/sitemap.xml.gz", &compressed).unwrap();
        assert_eq!(text, "https://example.com/a\n");
    }

    #[test]
    fn plain_body_passes_through() {
        let text = decompress_if_gzip("https://example.com/sitemap.xml", b"<urlset/>").unwrap();
        assert_eq!(text, "<urlset/>");
    }

    #[test]
    fn gz_extension_without_magic_is_treated_as_plain() {
        // Some servers serve .gz paths pre-decompressed.
        let text =
            decompress_if_gzip("https://example.com/sitemap.xml.gz", b"<urlset/>").unwrap();
        assert_eq!(text, "<urlset/>");
    }
}
