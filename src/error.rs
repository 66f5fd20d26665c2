//! Error taxonomy for site conversion.
//!
//! Per-page failures never surface here; they are converted into failed
//! `PageResult` records so one bad page cannot abort its siblings. Only the
//! two job-level failures an operator can do nothing about mid-crawl are
//! represented as errors.

use thiserror::Error;

/// Job-level conversion failure.
#[derive(Debug, Error)]
pub enum SiteError {
    /// The seed URL could not be parsed or used as a crawl root.
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeedUrl { url: String, reason: String },

    /// The headless browser could not be launched. Without a browser no page
    /// can be rendered, so the whole job fails.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Configuration rejected at build time (bad regex, zero concurrency).
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias for job-level results.
pub type SiteResult<T> = Result<T, SiteError>;
