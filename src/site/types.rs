//! Conversion outcome types.

use serde::{Deserialize, Serialize};

use crate::extractor::schema::{PageImage, PageMetadata};

/// Outcome of converting one URL. Exactly one of `content` / `error` is
/// populated, matching the success flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub success: bool,
    pub content: Option<String>,
    pub metadata: Option<PageMetadata>,
    #[serde(default)]
    pub images: Vec<PageImage>,
    pub error: Option<String>,
}

impl PageResult {
    #[must_use]
    pub fn succeeded(
        url: impl Into<String>,
        content: String,
        metadata: PageMetadata,
        images: Vec<PageImage>,
    ) -> Self {
        Self {
            url: url.into(),
            success: true,
            content: Some(content),
            metadata: Some(metadata),
            images,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            content: None,
            metadata: None,
            images: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Aggregate counts over one crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub total_pages: usize,
    pub successful_pages: usize,
    pub failed_pages: usize,
}

/// One file in the output archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveFile {
    pub name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub file_type: String,
}

impl ArchiveFile {
    #[must_use]
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            file_type: "text".to_string(),
        }
    }
}

/// The assembled conversion result: index document plus one Markdown file
/// per successful page. Failed pages appear only in the index's failure
/// section, never as files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteArchive {
    /// Normalized seed URL.
    pub url: String,
    /// Hostname of the converted site.
    pub name: String,
    /// Index Markdown.
    pub content: String,
    /// Index first, then one file per successful page.
    pub files: Vec<ArchiveFile>,
    pub success: bool,
    pub stats: CrawlStats,
    /// Collision-avoided output folder name (hostname + date + time).
    pub folder_name: String,
}
