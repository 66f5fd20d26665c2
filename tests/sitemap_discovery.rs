//! Sitemap discovery against a local HTTP server.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use url::Url;

use sitemark::cancel::CancelToken;
use sitemark::config::SiteConfig;
use sitemark::frontier::Provenance;
use sitemark::sitemap::SitemapParser;

fn test_config() -> SiteConfig {
    SiteConfig::builder()
        .fetch_retries(0)
        .fetch_timeout_secs(5)
        .discovery_timeout_secs(10)
        .build()
        .unwrap()
}

fn urlset(base: &str, paths: &[&str]) -> String {
    let urls: String = paths
        .iter()
        .map(|p| format!("<url><loc>{base}{p}</loc><priority>0.8</priority></url>"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">{urls}</urlset>"
    )
}

fn sitemapindex(base: &str, children: &[&str]) -> String {
    let entries: String = children
        .iter()
        .map(|c| format!("<sitemap><loc>{base}{c}</loc></sitemap>"))
        .collect();
    format!("<?xml version=\"1.0\"?><sitemapindex>{entries}</sitemapindex>")
}

async fn discover(server: &mockito::ServerGuard, config: &SiteConfig) -> Vec<sitemark::FrontierEntry> {
    let base = Url::parse(&server.url()).unwrap();
    let mut parser = SitemapParser::new(config).unwrap();
    parser.discover(&base, &CancelToken::new()).await
}

#[tokio::test]
async fn discovers_urlset_at_conventional_location() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _m = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(urlset(&base, &["/", "/about", "/docs/intro"]))
        .create_async()
        .await;

    let entries = discover(&server, &test_config()).await;
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| matches!(
        e.provenance,
        Provenance::Sitemap { .. }
    )));
    assert!(entries[1].original.ends_with("/about"));
}

#[tokio::test]
async fn first_successful_candidate_wins() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _first = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(urlset(&base, &["/only-this"]))
        .create_async()
        .await;
    // A later conventional candidate also exists but must never be merged.
    let _second = server
        .mock("GET", "/sitemap_index.xml")
        .with_status(200)
        .with_body(urlset(&base, &["/never-this"]))
        .expect(0)
        .create_async()
        .await;

    let entries = discover(&server, &test_config()).await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].original.ends_with("/only-this"));
}

#[tokio::test]
async fn robots_declared_sitemap_is_used_when_conventions_fail() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _robots = server
        .mock("GET", "/robots.txt")
        .with_status(200)
        .with_body(format!(
            "User-agent: *\nSitemap: {base}/custom/pages.xml\n"
        ))
        .create_async()
        .await;
    let _sitemap = server
        .mock("GET", "/custom/pages.xml")
        .with_status(200)
        .with_body(urlset(&base, &["/a", "/b"]))
        .create_async()
        .await;

    let entries = discover(&server, &test_config()).await;
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn sitemap_index_expands_children() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _index = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(sitemapindex(&base, &["/maps/a.xml", "/maps/b.xml"]))
        .create_async()
        .await;
    let _a = server
        .mock("GET", "/maps/a.xml")
        .with_status(200)
        .with_body(urlset(&base, &["/a1", "/a2"]))
        .create_async()
        .await;
    let _b = server
        .mock("GET", "/maps/b.xml")
        .with_status(200)
        .with_body(urlset(&base, &["/b1"]))
        .create_async()
        .await;

    let entries = discover(&server, &test_config()).await;
    assert_eq!(entries.len(), 3);
}

#[tokio::test]
async fn cyclic_sitemap_index_terminates() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    // /sitemap.xml → /maps/a.xml → back to /sitemap.xml, plus real pages.
    let _root = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(sitemapindex(&base, &["/maps/a.xml"]))
        .create_async()
        .await;
    let _a = server
        .mock("GET", "/maps/a.xml")
        .with_status(200)
        .with_body(sitemapindex(&base, &["/sitemap.xml", "/maps/pages.xml"]))
        .create_async()
        .await;
    let _pages = server
        .mock("GET", "/maps/pages.xml")
        .with_status(200)
        .with_body(urlset(&base, &["/page"]))
        .create_async()
        .await;

    let entries = discover(&server, &test_config()).await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].original.ends_with("/page"));
}

#[tokio::test]
async fn index_nesting_beyond_max_depth_is_cut_off() {
    let config = SiteConfig::builder()
        .fetch_retries(0)
        .sitemap_max_depth(2)
        .build()
        .unwrap();

    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _l0 = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(sitemapindex(&base, &["/l1.xml"]))
        .create_async()
        .await;
    let _l1 = server
        .mock("GET", "/l1.xml")
        .with_status(200)
        .with_body(sitemapindex(&base, &["/l2.xml"]))
        .create_async()
        .await;
    // Depth bound stops before this level's children are expanded.
    let _l2 = server
        .mock("GET", "/l2.xml")
        .with_status(200)
        .with_body(sitemapindex(&base, &["/l3.xml"]))
        .create_async()
        .await;
    let _l3 = server
        .mock("GET", "/l3.xml")
        .with_status(200)
        .with_body(urlset(&base, &["/deep"]))
        .expect(0)
        .create_async()
        .await;

    let entries = discover(&server, &config).await;
    assert!(entries.is_empty());
}

#[tokio::test]
async fn gzip_sitemap_is_decompressed() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(urlset(&base, &["/zipped"]).as_bytes())
        .unwrap();
    let compressed = encoder.finish().unwrap();

    let _gz = server
        .mock("GET", "/sitemap.xml.gz")
        .with_status(200)
        .with_body(compressed)
        .create_async()
        .await;

    let entries = discover(&server, &test_config()).await;
    assert_eq!(entries.len(), 1);
    assert!(entries[0].original.ends_with("/zipped"));
}

#[tokio::test]
async fn plain_text_sitemap_is_parsed() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _txt = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(format!("{base}/one\n{base}/two\n"))
        .create_async()
        .await;

    let entries = discover(&server, &test_config()).await;
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn duplicate_locs_are_collapsed() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let body = format!(
        "<urlset>\
         <url><loc>{base}/same</loc></url>\
         <url><loc>{base}/same</loc></url>\
         <url><loc>{base}/same#fragment</loc></url>\
         </urlset>"
    );
    let _m = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let entries = discover(&server, &test_config()).await;
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn entry_cap_is_enforced() {
    let config = SiteConfig::builder()
        .fetch_retries(0)
        .max_pages(2)
        .build()
        .unwrap();

    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let _m = server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(urlset(&base, &["/a", "/b", "/c", "/d", "/e"]))
        .create_async()
        .await;

    let entries = discover(&server, &config).await;
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn absent_sitemap_yields_empty_result() {
    let server = mockito::Server::new_async().await;
    let entries = discover(&server, &test_config()).await;
    assert!(entries.is_empty());
}
