//! Sitemap document parsing: XML (`urlset` / `sitemapindex`) and plain text.

use anyhow::{Result, anyhow};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Default `<priority>` per the sitemaps.org protocol.
pub const DEFAULT_PRIORITY: f32 = 0.5;

/// One `<url>` entry from a urlset.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapRecord {
    pub loc: String,
    pub lastmod: Option<String>,
    pub priority: f32,
    pub changefreq: Option<String>,
}

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSitemap {
    /// Page entries.
    UrlSet(Vec<SitemapRecord>),
    /// A sitemap index: child sitemap locations to expand.
    Index(Vec<String>),
}

/// XML sniff: declaration prefix or a recognizable sitemap root element.
#[must_use]
pub fn looks_like_xml(body: &str) -> bool {
    let head = body.trim_start();
    head.starts_with("<?xml") || head.contains("<urlset") || head.contains("<sitemapindex")
}

/// Parse a sitemap body, sniffing XML vs newline-delimited plain text.
pub fn parse_sitemap(body: &str) -> Result<ParsedSitemap> {
    if looks_like_xml(body) {
        parse_xml(body)
    } else {
        Ok(parse_plain_text(body))
    }
}

/// Which container element the cursor is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    None,
    Url,
    Sitemap,
}

fn parse_xml(body: &str) -> Result<ParsedSitemap> {
    let mut reader = Reader::from_str(body);
    let mut records: Vec<SitemapRecord> = Vec::new();
    let mut children: Vec<String> = Vec::new();

    let mut saw_index_root = false;
    let mut container = Container::None;
    let mut field: Option<&'static str> = None;

    let mut loc = String::new();
    let mut lastmod: Option<String> = None;
    let mut priority: Option<f32> = None;
    let mut changefreq: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemapindex" => saw_index_root = true,
                b"url" => {
                    container = Container::Url;
                    loc.clear();
                    lastmod = None;
                    priority = None;
                    changefreq = None;
                }
                b"sitemap" => {
                    container = Container::Sitemap;
                    loc.clear();
                }
                b"loc" => field = Some("loc"),
                b"lastmod" => field = Some("lastmod"),
                b"priority" => field = Some("priority"),
                b"changefreq" => field = Some("changefreq"),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| anyhow!("invalid XML text content: {e}"))?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                match field {
                    Some("loc") => loc = text.to_string(),
                    Some("lastmod") => lastmod = Some(text.to_string()),
                    Some("priority") => priority = text.parse().ok(),
                    Some("changefreq") => changefreq = Some(text.to_string()),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"url" => {
                    if !loc.is_empty() {
                        records.push(SitemapRecord {
                            loc: std::mem::take(&mut loc),
                            lastmod: lastmod.take(),
                            priority: priority.take().unwrap_or(DEFAULT_PRIORITY),
                            changefreq: changefreq.take(),
                        });
                    }
                    container = Container::None;
                }
                b"sitemap" => {
                    if !loc.is_empty() {
                        children.push(std::mem::take(&mut loc));
                    }
                    container = Container::None;
                }
                b"loc" | b"lastmod" | b"priority" | b"changefreq" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                // Truncated feeds are common; keep whatever parsed cleanly.
                tracing::warn!("Sitemap XML error, keeping partial results: {e}");
                break;
            }
            _ => {}
        }
    }

    // A stray <loc> at top level belongs to whichever container the document
    // declared; lone URLs outside <url> elements are dropped.
    let _ = container;

    if saw_index_root && records.is_empty() {
        Ok(ParsedSitemap::Index(children))
    } else {
        Ok(ParsedSitemap::UrlSet(records))
    }
}

/// Newline-delimited plain-text sitemap: one absolute URL per line.
fn parse_plain_text(body: &str) -> ParsedSitemap {
    let records = body
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http://") || line.starts_with("https://"))
        .map(|line| SitemapRecord {
            loc: line.to_string(),
            lastmod: None,
            priority: DEFAULT_PRIORITY,
            changefreq: None,
        })
        .collect();
    ParsedSitemap::UrlSet(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urlset_with_all_fields() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url>
                <loc>https://example.com/</loc>
                <lastmod>2024-05-01</lastmod>
                <priority>0.9</priority>
                <changefreq>daily</changefreq>
              </url>
              <url>
                <loc>https://example.com/about</loc>
              </url>
            </urlset>"#;
        let ParsedSitemap::UrlSet(records) = parse_sitemap(xml).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].loc, "https://example.com/");
        assert_eq!(records[0].lastmod.as_deref(), Some("2024-05-01"));
        assert!((records[0].priority - 0.9).abs() < f32::EPSILON);
        assert_eq!(records[0].changefreq.as_deref(), Some("daily"));
        // Missing priority defaults to 0.5.
        assert!((records[1].priority - DEFAULT_PRIORITY).abs() < f32::EPSILON);
    }

    #[test]
    fn parses_sitemap_index() {
        let xml = r#"<?xml version="1.0"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>https://example.com/sitemap-a.xml</loc></sitemap>
              <sitemap><loc>https://example.com/sitemap-b.xml</loc></sitemap>
            </sitemapindex>"#;
        let ParsedSitemap::Index(children) = parse_sitemap(xml).unwrap() else {
            panic!("expected index");
        };
        assert_eq!(
            children,
            vec![
                "https://example.com/sitemap-a.xml",
                "https://example.com/sitemap-b.xml",
            ]
        );
    }

    #[test]
    fn parses_plain_text_lines() {
        let body = "https://example.com/a\n\nnot a url\nhttps://example.com/b\n";
        let ParsedSitemap::UrlSet(records) = parse_sitemap(body).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].loc, "https://example.com/b");
    }

    #[test]
    fn sniffs_xml_without_declaration() {
        assert!(looks_like_xml("  <urlset><url><loc>x</loc></url></urlset>"));
        assert!(!looks_like_xml("https://example.com/a\n"));
    }

    #[test]
    fn escaped_entities_are_unescaped() {
        let xml = "<urlset><url><loc>https://example.com/a?x=1&amp;y=2</loc></url></urlset>";
        let ParsedSitemap::UrlSet(records) = parse_sitemap(xml).unwrap() else {
            panic!("expected urlset");
        };
        assert_eq!(records[0].loc, "https://example.com/a?x=1&y=2");
    }
}
