//! Shared headless-browser lifecycle.
//!
//! One browser process serves the whole conversion job. It launches lazily on
//! first demand; concurrent first acquirers serialize on the slot lock so
//! exactly one launch happens. A disconnected browser is detected on the next
//! acquire and replaced. Pages are single-use: one page per URL conversion,
//! closed by the converting task via [`PageGuard`] on every exit path.

mod setup;

pub use setup::{find_browser_executable, launch_browser};

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetBlockedUrLsParams, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// URL patterns blocked when asset blocking is enabled. Skipping heavy media
/// cuts navigation time without affecting extracted text.
const BLOCKED_ASSET_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.ico", "*.woff", "*.woff2",
    "*.ttf", "*.otf", "*.mp4", "*.webm", "*.mp3", "*.avi", "*.mov",
];

/// Configuration for the shared browser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserPoolConfig {
    pub headless: bool,
    /// Explicit executable path; discovery runs when unset.
    pub executable: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
    pub request_timeout_secs: u64,
}

impl Default for BrowserPoolConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            window_width: 1280,
            window_height: 900,
            request_timeout_secs: 30,
        }
    }
}

/// Per-page setup applied at acquire time.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub user_agent: Option<String>,
    pub extra_headers: Vec<(String, String)>,
    pub block_assets: bool,
}

struct SharedBrowser {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
}

/// Launch-once pool around the single shared browser process.
pub struct BrowserPool {
    config: BrowserPoolConfig,
    /// Externally supplied browser; used as-is and never closed here.
    external: Option<Arc<Browser>>,
    slot: Mutex<Option<SharedBrowser>>,
}

impl BrowserPool {
    #[must_use]
    pub fn new(config: BrowserPoolConfig) -> Self {
        Self {
            config,
            external: None,
            slot: Mutex::new(None),
        }
    }

    /// Wrap an externally owned browser. The pool will hand out pages from it
    /// but [`shutdown`](Self::shutdown) leaves it running.
    #[must_use]
    pub fn with_browser(browser: Arc<Browser>) -> Self {
        Self {
            config: BrowserPoolConfig::default(),
            external: Some(browser),
            slot: Mutex::new(None),
        }
    }

    /// Create a fresh page configured per `options`.
    ///
    /// The first caller launches the browser; concurrent callers during the
    /// launch await the same slot lock rather than racing a second process.
    /// A browser that died since the last acquire is replaced transparently.
    pub async fn acquire_page(&self, options: &PageOptions) -> Result<PageGuard> {
        let browser = self.browser_handle().await?;

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to create page")?;

        if let Some(ua) = &options.user_agent {
            page.execute(SetUserAgentOverrideParams {
                user_agent: ua.clone(),
                accept_language: Some("en-US,en;q=0.9".to_string()),
                platform: None,
                user_agent_metadata: None,
            })
            .await
            .context("Failed to set user agent")?;
        }

        if !options.extra_headers.is_empty() {
            let map: serde_json::Map<String, serde_json::Value> = options
                .extra_headers
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            page.execute(SetExtraHttpHeadersParams {
                headers: Headers::new(serde_json::Value::Object(map)),
            })
            .await
            .context("Failed to set extra headers")?;
        }

        if options.block_assets {
            page.execute(SetBlockedUrLsParams {
                urls: BLOCKED_ASSET_PATTERNS
                    .iter()
                    .map(|p| (*p).to_string())
                    .collect(),
            })
            .await
            .context("Failed to set blocked URL patterns")?;
        }

        Ok(PageGuard::new(page))
    }

    /// Launch the browser now if it is not already running.
    ///
    /// Lets callers surface launch failure as a job-level error before any
    /// page work starts.
    pub async fn warm_up(&self) -> Result<()> {
        self.browser_handle().await.map(|_| ())
    }

    async fn browser_handle(&self) -> Result<Arc<Browser>> {
        if let Some(external) = &self.external {
            return Ok(Arc::clone(external));
        }

        let mut slot = self.slot.lock().await;

        if let Some(shared) = slot.as_ref() {
            // Liveness ping; a dead browser is dropped so this acquire
            // relaunches instead of failing every subsequent page.
            match shared.browser.version().await {
                Ok(_) => return Ok(Arc::clone(&shared.browser)),
                Err(e) => {
                    warn!("Cached browser failed liveness check ({e}), relaunching");
                    if let Some(dead) = slot.take() {
                        dead.handler.abort();
                    }
                }
            }
        }

        debug!("Launching shared browser");
        let (browser, handler) = setup::launch_browser(&self.config).await?;
        let browser = Arc::new(browser);
        *slot = Some(SharedBrowser {
            browser: Arc::clone(&browser),
            handler,
        });
        Ok(browser)
    }

    /// Close the owned browser, if any. Externally supplied browsers are left
    /// untouched. Safe to call multiple times.
    pub async fn shutdown(&self) {
        let Some(shared) = self.slot.lock().await.take() else {
            return;
        };

        // Close the browser before aborting the handler so the close command
        // still has a live CDP connection to travel over.
        match Arc::try_unwrap(shared.browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {e}");
                }
                let _ = browser.wait().await;
            }
            Err(arc) => {
                warn!(
                    "Browser still has {} strong references at shutdown; letting Drop clean up",
                    Arc::strong_count(&arc)
                );
            }
        }
        shared.handler.abort();
    }
}

impl std::fmt::Debug for BrowserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserPool")
            .field("config", &self.config)
            .field("external", &self.external.is_some())
            .finish_non_exhaustive()
    }
}

/// RAII page handle: closing happens on drop, on every exit path.
///
/// `Page::close` is async, so Drop spawns the close instead of blocking the
/// runtime; [`close`](Self::close) is available when the caller wants to
/// await completion.
pub struct PageGuard {
    page: Option<Page>,
}

impl PageGuard {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page: Some(page) }
    }

    /// The wrapped page. Panics only if called after [`close`](Self::close),
    /// which consumes the guard.
    #[must_use]
    pub fn page(&self) -> &Page {
        match &self.page {
            Some(page) => page,
            None => unreachable!("PageGuard::close consumes the guard"),
        }
    }

    /// Close the page explicitly, awaiting the browser acknowledgement.
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Page close failed: {e}");
            }
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            tokio::spawn(async move {
                if let Err(e) = page.close().await {
                    debug!("Page close failed in drop: {e}");
                }
            });
        }
    }
}
