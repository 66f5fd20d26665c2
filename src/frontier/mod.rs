//! URL frontier construction.
//!
//! When a site exposes no usable sitemap, the frontier is built from the
//! rendered seed page's outbound links: same-host filter, normalization and
//! dedup, skip-pattern exclusion, heuristic scoring, and partitioning into
//! priority-sorted chunks for bounded-concurrency processing.

mod normalize;
mod scoring;
pub mod scripts;

pub use normalize::{is_tracking_param, normalize_parsed, normalize_url};
pub use scoring::{BASE_SCORE, LinkObservation, SIGNALS, Signal, score_link};

use anyhow::{Context, Result, anyhow};
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use crate::config::SiteConfig;

/// Where a frontier entry came from, with its ordering hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Provenance {
    /// The crawl seed itself; always converted first.
    Seed,
    /// Discovered in a sitemap.
    Sitemap {
        lastmod: Option<String>,
        priority: f32,
        changefreq: Option<String>,
    },
    /// Discovered by link crawling, with its heuristic score.
    Link { score: i32 },
}

/// One candidate URL, unique by normalized form within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierEntry {
    /// Canonical dedup key.
    pub normalized: String,
    /// Original URL, preserved for navigation and display.
    pub original: String,
    pub provenance: Provenance,
}

impl FrontierEntry {
    #[must_use]
    pub fn seed(normalized: String, original: String) -> Self {
        Self {
            normalized,
            original,
            provenance: Provenance::Seed,
        }
    }

    /// Ordering hint used when sorting a chunk.
    #[must_use]
    pub fn priority_hint(&self) -> i32 {
        match &self.provenance {
            Provenance::Seed => i32::MAX,
            Provenance::Sitemap { priority, .. } => (priority * 100.0) as i32,
            Provenance::Link { score } => *score,
        }
    }
}

/// Raw link record harvested in-page.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestedLink {
    pub href: String,
    pub resolved: String,
    #[serde(default)]
    pub in_nav: bool,
    #[serde(default)]
    pub in_content: bool,
}

/// Harvest the rendered seed page's links and build priority chunks.
pub async fn find_frontier(
    page: &Page,
    seed: &Url,
    config: &SiteConfig,
) -> Result<Vec<Vec<FrontierEntry>>> {
    let links: Vec<HarvestedLink> = page
        .evaluate(scripts::HARVEST_LINKS_SCRIPT)
        .await
        .context("Failed to harvest links")?
        .into_value()
        .map_err(|e| anyhow!("Failed to deserialize harvested links: {e}"))?;

    debug!("Harvested {} raw links from {seed}", links.len());
    let entries = build_frontier(links, seed, config);
    debug!("Frontier holds {} unique URLs after filtering", entries.len());
    Ok(chunk_frontier(entries, config.chunk_size()))
}

/// Filter, normalize, dedup and score harvested links. Pure, so the whole
/// policy is testable without a browser.
#[must_use]
pub fn build_frontier(
    links: Vec<HarvestedLink>,
    seed: &Url,
    config: &SiteConfig,
) -> Vec<FrontierEntry> {
    let seed_host = seed.host_str().map(strip_www).unwrap_or_default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries = Vec::new();

    for link in links {
        let href = link.href.trim();
        // Self-referential and non-navigational targets.
        if href.is_empty() || href == "#" || href == "/" {
            continue;
        }
        let lowered = href.to_ascii_lowercase();
        if lowered.starts_with("javascript:")
            || lowered.starts_with("mailto:")
            || lowered.starts_with("tel:")
            || lowered.starts_with('#')
        {
            continue;
        }

        let Ok(resolved) = Url::parse(&link.resolved) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let host_matches = resolved
            .host_str()
            .map(strip_www)
            .is_some_and(|host| host.eq_ignore_ascii_case(seed_host));
        if !host_matches {
            continue;
        }

        let normalized = normalize_parsed(&resolved);
        if config.is_url_skipped(&normalized) {
            continue;
        }
        if !config.passes_path_filter(resolved.path()) {
            continue;
        }
        if !seen.insert(normalized.clone()) {
            continue;
        }

        let observation = LinkObservation {
            path: resolved.path().to_string(),
            in_nav: link.in_nav,
            in_content: link.in_content,
        };
        entries.push(FrontierEntry {
            normalized,
            original: resolved.to_string(),
            provenance: Provenance::Link {
                score: score_link(&observation),
            },
        });

        if entries.len() >= config.link_crawl_max_pages() {
            break;
        }
    }

    entries
}

/// Partition entries into fixed-size chunks in discovery order, each chunk
/// sorted by descending priority so high-value pages convert earlier within
/// every concurrency wave.
#[must_use]
pub fn chunk_frontier(entries: Vec<FrontierEntry>, chunk_size: usize) -> Vec<Vec<FrontierEntry>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks: Vec<Vec<FrontierEntry>> = Vec::new();
    for entry in entries {
        match chunks.last_mut() {
            Some(chunk) if chunk.len() < chunk_size => chunk.push(entry),
            _ => chunks.push(vec![entry]),
        }
    }
    for chunk in &mut chunks {
        chunk.sort_by_key(|e| std::cmp::Reverse(e.priority_hint()));
    }
    chunks
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
