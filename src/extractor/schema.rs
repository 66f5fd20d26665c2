//! Data shapes crossing the extraction boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resolved metadata for one converted page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageMetadata {
    pub title: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    pub site_name: Option<String>,
    /// When the page was captured by this crawl.
    pub captured_at: DateTime<Utc>,
}

/// One inline image worth keeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageImage {
    pub src: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Result of extracting one rendered page.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Main-content HTML fragment.
    pub html: String,
    pub metadata: PageMetadata,
    pub images: Vec<PageImage>,
}

/// Raw in-page metadata dump, resolved host-side by
/// [`resolve_metadata`](crate::extractor::resolve_metadata).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataProbe {
    /// All `<meta>` name/property → content pairs.
    #[serde(default)]
    pub meta: HashMap<String, String>,
    /// `<title>` text.
    #[serde(default)]
    pub title: Option<String>,
    /// First `<h1>` text.
    #[serde(default)]
    pub first_heading: Option<String>,
}

/// Raw `<img>` record as harvested in-page; filtering happens host-side.
#[derive(Debug, Clone, Deserialize)]
pub struct RawImage {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// One candidate content region returned by an in-page query.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentCandidate {
    pub html: String,
    pub text_length: usize,
    #[serde(default)]
    pub heading_count: usize,
    #[serde(default)]
    pub paragraph_count: usize,
    #[serde(default)]
    pub list_count: usize,
}

impl ContentCandidate {
    /// A candidate is meaningful when it has real prose volume and at least
    /// one structural content element. This rejects empty shell containers
    /// that match a content selector but hold only chrome.
    #[must_use]
    pub fn is_meaningful(&self, min_text_length: usize) -> bool {
        self.text_length >= min_text_length
            && (self.heading_count > 0 || self.paragraph_count > 0 || self.list_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meaningful_requires_structure() {
        let candidate = ContentCandidate {
            html: "<div>long text...</div>".into(),
            text_length: 5000,
            heading_count: 0,
            paragraph_count: 0,
            list_count: 0,
        };
        assert!(!candidate.is_meaningful(200));
    }

    #[test]
    fn meaningful_requires_length() {
        let candidate = ContentCandidate {
            html: "<p>hi</p>".into(),
            text_length: 2,
            heading_count: 0,
            paragraph_count: 1,
            list_count: 0,
        };
        assert!(!candidate.is_meaningful(200));
    }

    #[test]
    fn article_is_meaningful() {
        let candidate = ContentCandidate {
            html: "<article>...</article>".into(),
            text_length: 1200,
            heading_count: 2,
            paragraph_count: 9,
            list_count: 1,
        };
        assert!(candidate.is_meaningful(200));
    }
}
