//! Link classification and rendering.
//!
//! External links keep standard Markdown form; links into the same site
//! become wiki-style `[[page]]` references so the assembled archive
//! cross-links between its own files; same-page fragments become `[[name]]`.

use url::Url;
use urlencoding::decode;

/// Where a link points, relative to the page being converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Different host; rendered as `[text](url)`.
    External(Url),
    /// Same host; rendered as `[[page]]` (or `[[page|text]]`).
    Internal { page_name: String },
    /// Same-page `#fragment`; rendered as `[[name]]`.
    Fragment { name: String },
}

/// Classify an `href`.
///
/// Relative hrefs resolve against `resolve_base` (an in-document `<base>`
/// when present, else the page URL); the internal/external verdict compares
/// hosts against `site_base`, the site actually being archived.
///
/// Returns `None` for targets that should render as bare text
/// (`javascript:`, `mailto:`, `tel:`, empty).
#[must_use]
pub fn classify_link(
    href: &str,
    resolve_base: Option<&Url>,
    site_base: Option<&Url>,
) -> Option<LinkTarget> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if let Some(fragment) = href.strip_prefix('#') {
        if fragment.is_empty() {
            return None;
        }
        return Some(LinkTarget::Fragment {
            name: decode(fragment)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| fragment.to_string()),
        });
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let resolved = match resolve_base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }

    match site_base {
        Some(site) if same_site(&resolved, site) => Some(LinkTarget::Internal {
            page_name: page_name_from_url(&resolved),
        }),
        Some(_) => Some(LinkTarget::External(resolved)),
        // No site to compare against; everything absolute is external.
        None => Some(LinkTarget::External(resolved)),
    }
}

/// Render a classified link with its visible text.
#[must_use]
pub fn render_link(text: &str, target: &LinkTarget) -> String {
    let text = text.trim();
    match target {
        LinkTarget::External(url) => {
            let label = if text.is_empty() { url.as_str() } else { text };
            format!("[{label}]({url})")
        }
        LinkTarget::Internal { page_name } => {
            if text.is_empty() || text == page_name {
                format!("[[{page_name}]]")
            } else {
                format!("[[{page_name}|{text}]]")
            }
        }
        LinkTarget::Fragment { name } => {
            let label = if text.is_empty() { name } else { text };
            format!("[[{label}]]")
        }
    }
}

/// Host comparison with the `www.` prefix normalized away, so
/// `www.example.com` and `example.com` count as the same site.
fn same_site(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(a), Some(b)) => strip_www(a).eq_ignore_ascii_case(strip_www(b)),
        _ => false,
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Wiki page name from a URL path: last segment, extension stripped,
/// percent-decoded; the site root becomes `index`.
#[must_use]
pub fn page_name_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty());

    match segment {
        Some(s) => {
            let stem = s.rsplit_once('.').map_or(s, |(stem, _)| stem);
            let stem = if stem.is_empty() { s } else { stem };
            decode(stem)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| stem.to_string())
        }
        None => "index".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/guide").unwrap()
    }

    fn classify(href: &str) -> Option<LinkTarget> {
        classify_link(href, Some(&base()), Some(&base()))
    }

    #[test]
    fn external_link_is_standard_markdown() {
        let target = classify("https://other.org/page").unwrap();
        assert_eq!(
            render_link("Other", &target),
            "[Other](https://other.org/page)"
        );
    }

    #[test]
    fn internal_root_relative_link_is_wiki_style() {
        let target = classify("/docs/install").unwrap();
        assert_eq!(
            target,
            LinkTarget::Internal {
                page_name: "install".into()
            }
        );
        assert_eq!(render_link("install", &target), "[[install]]");
        assert_eq!(
            render_link("Install guide", &target),
            "[[install|Install guide]]"
        );
    }

    #[test]
    fn www_host_is_same_site() {
        let target = classify("https://www.example.com/about").unwrap();
        assert!(matches!(target, LinkTarget::Internal { .. }));
    }

    #[test]
    fn document_base_resolves_but_site_base_classifies() {
        // Page served with <base href="https://cdn.example.org/">: relative
        // links resolve against the CDN, but the CDN is not the archived
        // site, so they classify as external.
        let cdn = Url::parse("https://cdn.example.org/").unwrap();
        let target = classify_link("page", Some(&cdn), Some(&base())).unwrap();
        assert_eq!(
            target,
            LinkTarget::External(Url::parse("https://cdn.example.org/page").unwrap())
        );
    }

    #[test]
    fn fragment_link_uses_fragment_name_when_no_text() {
        let target = classify("#setup").unwrap();
        assert_eq!(render_link("", &target), "[[setup]]");
        assert_eq!(render_link("Setup section", &target), "[[Setup section]]");
    }

    #[test]
    fn scheme_noise_is_dropped() {
        assert_eq!(classify("javascript:void(0)"), None);
        assert_eq!(classify("mailto:hi@example.com"), None);
        assert_eq!(classify("tel:+123456"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("#"), None);
    }

    #[test]
    fn page_name_handles_root_and_extensions() {
        assert_eq!(
            page_name_from_url(&Url::parse("https://example.com/").unwrap()),
            "index"
        );
        assert_eq!(
            page_name_from_url(&Url::parse("https://example.com/a/b/notes.html").unwrap()),
            "notes"
        );
    }
}
