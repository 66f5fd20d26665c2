//! HTML fragment → Markdown conversion.
//!
//! The rule set follows the archive's cross-linking needs: standard links
//! for external targets, wiki links for in-site targets, embeds for local
//! attachments, pipe tables with recursively converted cells. Conversion
//! failure never loses a page; callers fall back to
//! [`fallback_document`].

mod links;
mod postprocess;
mod table;
mod walker;

pub use links::{LinkTarget, classify_link, page_name_from_url, render_link};
pub use postprocess::{normalize_blank_lines, normalize_inline_spacing};

use anyhow::Result;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use walker::Renderer;

static BASE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("base[href]").expect("BUG: hardcoded CSS selector 'base[href]' is invalid")
});

/// Options for one document conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Base URL for resolving relative links and classifying internal ones.
    pub base_url: Option<Url>,
    /// Path prefix identifying images already relocated next to the archive;
    /// such images render as `![[path]]` embeds.
    pub attachment_prefix: Option<String>,
}

/// Convert an HTML fragment to Markdown.
///
/// An in-document `<base href>` overrides `options.base_url` for link
/// resolution, matching browser behavior.
pub fn to_markdown(html: &str, options: &ConversionOptions) -> Result<String> {
    let document = Html::parse_fragment(html);

    let doc_base = document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| match &options.base_url {
            Some(base) => base.join(href).ok(),
            None => Url::parse(href).ok(),
        });
    let resolve_base = doc_base.or_else(|| options.base_url.clone());

    let renderer = Renderer::new(
        resolve_base,
        options.base_url.clone(),
        options.attachment_prefix.clone(),
    );
    let rendered = renderer.render_fragment(*document.root_element());
    Ok(normalize_blank_lines(&normalize_inline_spacing(&rendered)))
}

/// Minimal document emitted when conversion fails, so the page still appears
/// in the archive instead of vanishing.
#[must_use]
pub fn fallback_document(title: &str, url: &str, error: &str) -> String {
    format!(
        "# {title}\n\nSource: {url}\n\n> Conversion failed: {error}\n",
        title = if title.is_empty() { "Untitled" } else { title },
    )
}
