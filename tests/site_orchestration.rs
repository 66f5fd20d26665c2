//! End-to-end orchestration scenarios with a fake page converter.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use url::Url;

use sitemark::cancel::CancelToken;
use sitemark::config::SiteConfig;
use sitemark::error::SiteError;
use sitemark::extractor::schema::PageMetadata;
use sitemark::frontier::{FrontierEntry, Provenance};
use sitemark::site::{PageConverter, PageResult, SiteConverter};

/// Test double for the browser-backed pipeline.
#[derive(Default)]
struct FakeConverter {
    /// URLs whose conversion always fails.
    fail_urls: HashSet<String>,
    /// Chunks returned by link discovery.
    link_chunks: Vec<Vec<FrontierEntry>>,
    /// Every URL that reached convert_page, in call order.
    conversions: Arc<Mutex<Vec<String>>>,
    /// Token cancelled during link discovery, simulating an operator abort
    /// between discovery and conversion.
    cancel_on_discover: Option<CancelToken>,
}

fn metadata(title: &str) -> PageMetadata {
    PageMetadata {
        title: title.to_string(),
        description: None,
        author: None,
        published: None,
        site_name: None,
        captured_at: Utc::now(),
    }
}

impl PageConverter for FakeConverter {
    async fn prepare(&self) -> Result<(), SiteError> {
        Ok(())
    }

    async fn convert_page(&self, url: &str, _config: &SiteConfig) -> PageResult {
        self.conversions.lock().unwrap().push(url.to_string());
        if self.fail_urls.contains(url) {
            PageResult::failed(url, "net::ERR_CONNECTION_REFUSED")
        } else {
            let title = url.rsplit('/').next().unwrap_or("page");
            PageResult::succeeded(
                url,
                format!("# {title}\n\nBody of {url}\n"),
                metadata(title),
                Vec::new(),
            )
        }
    }

    async fn discover_links(
        &self,
        _seed: &Url,
        _config: &SiteConfig,
    ) -> anyhow::Result<Vec<Vec<FrontierEntry>>> {
        if let Some(cancel) = &self.cancel_on_discover {
            cancel.cancel("operator abort");
        }
        Ok(self.link_chunks.clone())
    }
}

fn link_entry(url: &str, score: i32) -> FrontierEntry {
    FrontierEntry {
        normalized: url.to_string(),
        original: url.to_string(),
        provenance: Provenance::Link { score },
    }
}

fn sitemap_body(base: &str, paths: &[&str]) -> String {
    let urls: String = paths
        .iter()
        .map(|p| format!("<url><loc>{base}{p}</loc></url>"))
        .collect();
    format!("<?xml version=\"1.0\"?><urlset>{urls}</urlset>")
}

fn test_config() -> SiteConfig {
    SiteConfig::builder()
        .fetch_retries(0)
        .fetch_timeout_secs(5)
        .discovery_timeout_secs(10)
        .concurrency(2)
        .build()
        .unwrap()
}

#[tokio::test]
async fn sitemap_crawl_converts_every_page() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _m = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(sitemap_body(&base, &["/", "/a", "/b", "/c", "/d"]))
        .create_async()
        .await;

    let converter = SiteConverter::with_converter(test_config(), FakeConverter::default());
    let archive = converter.convert(&base, CancelToken::new()).await.unwrap();

    assert!(archive.success);
    assert_eq!(archive.stats.total_pages, 5);
    assert_eq!(archive.stats.successful_pages, 5);
    assert_eq!(archive.stats.failed_pages, 0);
    // Index plus one file per page.
    assert_eq!(archive.files.len(), 6);
    assert_eq!(archive.files[0].name, "index.md");
}

#[tokio::test]
async fn one_failing_page_does_not_abort_the_crawl() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _m = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(sitemap_body(&base, &["/a", "/b", "/c"]))
        .create_async()
        .await;

    let converter = SiteConverter::with_converter(
        test_config(),
        FakeConverter {
            fail_urls: HashSet::from([format!("{base}/b")]),
            ..FakeConverter::default()
        },
    );
    let archive = converter.convert(&base, CancelToken::new()).await.unwrap();

    // Seed + a + b + c; only b fails.
    assert_eq!(archive.stats.total_pages, 4);
    assert_eq!(archive.stats.failed_pages, 1);
    assert!(archive.success);
    assert!(archive.content.contains("## Failed pages"));
    assert!(archive.content.contains("net::ERR_CONNECTION_REFUSED"));
    // The failed page produced no file.
    assert_eq!(archive.files.len(), archive.stats.successful_pages + 1);
}

#[tokio::test]
async fn no_sitemap_and_no_links_converts_seed_only() {
    let server = mockito::Server::new_async().await;
    let base = server.url();

    let converter = SiteConverter::with_converter(test_config(), FakeConverter::default());
    let archive = converter.convert(&base, CancelToken::new()).await.unwrap();

    assert_eq!(archive.stats.total_pages, 1);
    assert_eq!(archive.stats.successful_pages, 1);
    assert_eq!(archive.files.len(), 2);
}

#[tokio::test]
async fn link_discovery_feeds_frontier_when_sitemap_is_absent() {
    let server = mockito::Server::new_async().await;
    let base = server.url();

    let conversions = Arc::new(Mutex::new(Vec::new()));
    let converter = SiteConverter::with_converter(
        test_config(),
        FakeConverter {
            link_chunks: vec![vec![
                link_entry(&format!("{base}/docs"), 115),
                link_entry(&format!("{base}/blog/post"), 40),
            ]],
            conversions: Arc::clone(&conversions),
            ..FakeConverter::default()
        },
    );
    let archive = converter.convert(&base, CancelToken::new()).await.unwrap();

    assert_eq!(archive.stats.total_pages, 3);
    let converted = conversions.lock().unwrap().clone();
    assert_eq!(converted.len(), 3);
    // Seed is dispatched first.
    assert_eq!(converted[0], format!("{base}/"));
}

#[tokio::test]
async fn duplicate_discoveries_convert_once() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    // The sitemap lists the seed and a page twice (tracking-param variant).
    let body = format!(
        "<urlset>\
         <url><loc>{base}/</loc></url>\
         <url><loc>{base}/a</loc></url>\
         <url><loc>{base}/a?utm_source=feed</loc></url>\
         </urlset>"
    );
    let _m = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let conversions = Arc::new(Mutex::new(Vec::new()));
    let converter = SiteConverter::with_converter(
        test_config(),
        FakeConverter {
            conversions: Arc::clone(&conversions),
            ..FakeConverter::default()
        },
    );
    let archive = converter.convert(&base, CancelToken::new()).await.unwrap();

    // Seed appears once, /a appears once: frontier uniqueness.
    assert_eq!(archive.stats.total_pages, 2);
    let converted = conversions.lock().unwrap().clone();
    assert_eq!(converted.len(), 2);
    let unique: HashSet<&String> = converted.iter().collect();
    assert_eq!(unique.len(), converted.len());
}

#[tokio::test]
async fn path_filter_restricts_sitemap_frontier() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _m = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(sitemap_body(&base, &["/docs/a", "/docs/b", "/blog/c"]))
        .create_async()
        .await;

    let config = SiteConfig::builder()
        .fetch_retries(0)
        .path_filter("/docs")
        .build()
        .unwrap();
    let converter = SiteConverter::with_converter(config, FakeConverter::default());
    let archive = converter.convert(&base, CancelToken::new()).await.unwrap();

    // Seed plus the two /docs pages; /blog/c is filtered out.
    assert_eq!(archive.stats.total_pages, 3);
}

#[tokio::test]
async fn cancelled_job_marks_unattempted_pages_failed() {
    // No sitemap: discovery falls through to the link finder, which cancels
    // the token before the frontier is dispatched.
    let server = mockito::Server::new_async().await;
    let base = server.url();

    let cancel = CancelToken::new();
    let converter = SiteConverter::with_converter(
        test_config(),
        FakeConverter {
            link_chunks: vec![vec![
                link_entry(&format!("{base}/a"), 60),
                link_entry(&format!("{base}/b"), 55),
            ]],
            cancel_on_discover: Some(cancel.clone()),
            ..FakeConverter::default()
        },
    );
    let archive = converter.convert(&base, cancel).await.unwrap();

    // Nothing was dispatched; every frontier entry is recorded as failed,
    // and the archive still assembles with a failure section.
    assert_eq!(archive.stats.total_pages, 3);
    assert_eq!(archive.stats.successful_pages, 0);
    assert!(archive.success);
    assert!(archive.content.contains("operator abort"));
}

#[tokio::test]
async fn invalid_seed_is_a_job_error() {
    let converter = SiteConverter::with_converter(test_config(), FakeConverter::default());
    let result = converter.convert("not a url at all", CancelToken::new()).await;
    assert!(matches!(result, Err(SiteError::InvalidSeedUrl { .. })));
}
