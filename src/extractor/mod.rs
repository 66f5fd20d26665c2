//! Main-content extraction from a cleaned, stabilized page.
//!
//! Location runs through four tiers: a prioritized selector list with a
//! content-meaningfulness gate, a scored scan of generic blocks, the bare
//! text nodes under body, and finally the full body HTML. A tier that throws
//! falls through to the next tier rather than failing the page.

mod images;
mod metadata;
pub mod schema;
pub mod scripts;

pub use images::{filter_images, looks_like_image};
pub use metadata::{resolve_metadata, title_from_url};

use anyhow::{Context, Result, anyhow};
use chromiumoxide::Page;
use tracing::{debug, warn};
use url::Url;

use schema::{ContentCandidate, ExtractedContent, MetadataProbe, RawImage};

/// Content container selectors in priority order: framework roots first,
/// then semantic elements, then conventional class/id names.
pub const CONTENT_SELECTORS: &[&str] = &[
    "#__next main",
    "#root main",
    "main",
    "article",
    "[role='main']",
    "[itemprop='articleBody']",
    ".post-content",
    ".entry-content",
    ".article-body",
    ".article-content",
    ".markdown-body",
    ".docs-content",
    "#main-content",
    ".main-content",
    "#content",
    ".content",
];

/// Minimum text for a generic block to count in the tier-b scan.
const MIN_BLOCK_TEXT_LENGTH: usize = 100;
/// How many of the largest blocks tier b combines.
const MAX_COMBINED_BLOCKS: usize = 3;

/// Extract main content, metadata and images from a prepared page.
pub async fn extract(
    page: &Page,
    base_url: &Url,
    min_content_length: usize,
) -> Result<ExtractedContent> {
    let html = locate_content(page, min_content_length).await?;

    let metadata = match probe_metadata(page).await {
        Ok(probe) => resolve_metadata(&probe, base_url),
        Err(e) => {
            warn!("Metadata probe failed for {base_url}: {e:#}");
            resolve_metadata(&MetadataProbe::default(), base_url)
        }
    };

    let images = match harvest_images(page).await {
        Ok(raw) => filter_images(raw, base_url),
        Err(e) => {
            warn!("Image harvest failed for {base_url}: {e:#}");
            Vec::new()
        }
    };

    Ok(ExtractedContent {
        html,
        metadata,
        images,
    })
}

/// Run the four-tier location strategy.
async fn locate_content(page: &Page, min_content_length: usize) -> Result<String> {
    // Tier a: prioritized selectors, first selector with meaningful matches
    // wins; multiple meaningful matches for that selector are combined.
    for selector in CONTENT_SELECTORS {
        match query_candidates(page, selector).await {
            Ok(candidates) => {
                let meaningful: Vec<&ContentCandidate> = candidates
                    .iter()
                    .filter(|c| c.is_meaningful(min_content_length))
                    .collect();
                if !meaningful.is_empty() {
                    debug!(
                        "Main content via selector '{selector}' ({} match(es))",
                        meaningful.len()
                    );
                    return Ok(combine(&meaningful));
                }
            }
            Err(e) => {
                warn!("Selector query '{selector}' failed: {e:#}");
            }
        }
    }

    // Tier b: topmost generic blocks, largest few combined.
    match scan_blocks(page).await {
        Ok(mut blocks) => {
            blocks.retain(|c| {
                c.text_length > MIN_BLOCK_TEXT_LENGTH && c.is_meaningful(MIN_BLOCK_TEXT_LENGTH)
            });
            if !blocks.is_empty() {
                blocks.sort_by(|a, b| b.text_length.cmp(&a.text_length));
                blocks.truncate(MAX_COMBINED_BLOCKS);
                debug!("Main content via block scan ({} block(s))", blocks.len());
                let refs: Vec<&ContentCandidate> = blocks.iter().collect();
                return Ok(combine(&refs));
            }
        }
        Err(e) => {
            warn!("Block scan failed: {e:#}");
        }
    }

    // Tier c: bare text nodes as paragraphs.
    match collect_text_nodes(page).await {
        Ok(chunks) if !chunks.is_empty() => {
            debug!("Main content via text nodes ({} chunk(s))", chunks.len());
            let paragraphs: String = chunks
                .iter()
                .map(|chunk| format!("<p>{}</p>", escape_text(chunk)))
                .collect();
            return Ok(paragraphs);
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Text node collection failed: {e:#}");
        }
    }

    // Tier d: whole body.
    debug!("Main content fallback: full body HTML");
    page.evaluate(scripts::BODY_HTML_SCRIPT)
        .await
        .context("Failed to read body HTML")?
        .into_value()
        .map_err(|e| anyhow!("Failed to deserialize body HTML: {e}"))
}

async fn query_candidates(page: &Page, selector: &str) -> Result<Vec<ContentCandidate>> {
    page.evaluate(scripts::content_query_script(selector))
        .await
        .context("Failed to run content query")?
        .into_value()
        .map_err(|e| anyhow!("Failed to deserialize content candidates: {e}"))
}

async fn scan_blocks(page: &Page) -> Result<Vec<ContentCandidate>> {
    page.evaluate(scripts::BLOCK_SCAN_SCRIPT)
        .await
        .context("Failed to run block scan")?
        .into_value()
        .map_err(|e| anyhow!("Failed to deserialize block candidates: {e}"))
}

async fn collect_text_nodes(page: &Page) -> Result<Vec<String>> {
    page.evaluate(scripts::TEXT_NODES_SCRIPT)
        .await
        .context("Failed to collect text nodes")?
        .into_value()
        .map_err(|e| anyhow!("Failed to deserialize text nodes: {e}"))
}

async fn probe_metadata(page: &Page) -> Result<MetadataProbe> {
    page.evaluate(scripts::METADATA_SCRIPT)
        .await
        .context("Failed to run metadata probe")?
        .into_value()
        .map_err(|e| anyhow!("Failed to deserialize metadata probe: {e}"))
}

async fn harvest_images(page: &Page) -> Result<Vec<RawImage>> {
    page.evaluate(scripts::IMAGES_SCRIPT)
        .await
        .context("Failed to harvest images")?
        .into_value()
        .map_err(|e| anyhow!("Failed to deserialize image records: {e}"))
}

fn combine(candidates: &[&ContentCandidate]) -> String {
    candidates
        .iter()
        .map(|c| c.html.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text_length: usize, paragraphs: usize) -> ContentCandidate {
        ContentCandidate {
            html: format!("<div data-len=\"{text_length}\"></div>"),
            text_length,
            heading_count: 0,
            paragraph_count: paragraphs,
            list_count: 0,
        }
    }

    #[test]
    fn combine_joins_in_order() {
        let a = candidate(500, 3);
        let b = candidate(300, 2);
        let combined = combine(&[&a, &b]);
        let first = combined.find("data-len=\"500\"").unwrap();
        let second = combined.find("data-len=\"300\"").unwrap();
        assert!(first < second);
    }

    #[test]
    fn escape_text_handles_angle_brackets() {
        assert_eq!(escape_text("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn selector_priority_prefers_semantic_containers() {
        let main_pos = CONTENT_SELECTORS.iter().position(|s| *s == "main").unwrap();
        let content_pos = CONTENT_SELECTORS
            .iter()
            .position(|s| *s == ".content")
            .unwrap();
        assert!(main_pos < content_pos);
    }
}
