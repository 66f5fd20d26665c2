pub mod browser;
pub mod cancel;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod extractor;
pub mod frontier;
pub mod markdown;
pub mod sitemap;
pub mod site;
pub mod stabilize;

pub use browser::{BrowserPool, PageGuard};
pub use cancel::CancelToken;
pub use config::SiteConfig;
pub use error::SiteError;
pub use extractor::schema::{ExtractedContent, PageImage, PageMetadata};
pub use frontier::{FrontierEntry, normalize_url};
pub use site::{ArchiveFile, CrawlStats, PageResult, SiteArchive, SiteConverter};

use std::sync::Arc;

/// Convert an entire website into a Markdown archive.
///
/// Discovers pages via sitemap (falling back to on-page link crawling),
/// renders each one in a shared headless browser, extracts the main content,
/// and assembles an index plus one Markdown file per successful page.
///
/// Only a browser launch failure or an unparseable seed URL surface as `Err`;
/// individual page failures are recorded inside the returned archive.
pub async fn convert_site(seed_url: &str, config: SiteConfig) -> Result<SiteArchive, SiteError> {
    let pool = Arc::new(BrowserPool::new(config.browser().clone()));
    let converter = SiteConverter::new(config, Arc::clone(&pool));
    let result = converter.convert(seed_url, CancelToken::new()).await;
    pool.shutdown().await;
    result
}
