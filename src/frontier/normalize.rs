//! URL canonicalization for frontier deduplication.
//!
//! Two URLs that differ only by fragment, tracking parameters, query order,
//! default port, or a trailing slash refer to the same logical page and must
//! normalize to the same string.

use url::Url;

/// Query parameters that only identify traffic sources, never content.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "msclkid", "yclid", "igshid", "mc_cid", "mc_eid", "_hsenc", "_hsmi",
    "ref", "ref_src", "spm", "s_kwcid",
];

/// Whether a query parameter is a known tracking parameter.
#[must_use]
pub fn is_tracking_param(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    lowered.starts_with("utm_") || TRACKING_PARAMS.contains(&lowered.as_str())
}

/// Canonical form of a parsed URL: lowercase host, no fragment, tracking
/// parameters dropped, remaining query pairs sorted, trailing slash trimmed
/// on non-root paths.
#[must_use]
pub fn normalize_parsed(url: &Url) -> String {
    let mut kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    kept.sort();

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let port = url
        .port()
        .map(|p| format!(":{p}"))
        .unwrap_or_default();

    let path = url.path();
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    let path = if path.is_empty() { "/" } else { path };

    let mut out = format!("{}://{host}{port}{path}", url.scheme());
    if !kept.is_empty() {
        out.push('?');
        for (i, (key, value)) in kept.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(key);
            if !value.is_empty() {
                out.push('=');
                out.push_str(value);
            }
        }
    }
    out
}

/// Canonicalize a URL string. Returns `None` for unparseable input or
/// non-HTTP schemes.
#[must_use]
pub fn normalize_url(input: &str) -> Option<String> {
    let url = Url::parse(input.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| normalize_parsed(&url))
}
