//! Host-side metadata resolution.
//!
//! Open Graph wins, then Twitter Card, then standard meta tags, then the
//! first heading, and as a last resort a title synthesized from the URL path.

use chrono::Utc;
use url::Url;

use super::schema::{MetadataProbe, PageMetadata};

/// Resolve the preference chain over a raw in-page probe.
#[must_use]
pub fn resolve_metadata(probe: &MetadataProbe, url: &Url) -> PageMetadata {
    let title = first_non_empty(&[
        probe.meta.get("og:title").map(String::as_str),
        probe.meta.get("twitter:title").map(String::as_str),
        probe.title.as_deref(),
        probe.first_heading.as_deref(),
    ])
    .unwrap_or_else(|| title_from_url(url));

    let description = first_non_empty(&[
        probe.meta.get("og:description").map(String::as_str),
        probe.meta.get("twitter:description").map(String::as_str),
        probe.meta.get("description").map(String::as_str),
    ]);

    let author = first_non_empty(&[
        probe.meta.get("author").map(String::as_str),
        probe.meta.get("article:author").map(String::as_str),
        probe.meta.get("og:article:author").map(String::as_str),
    ]);

    let published = first_non_empty(&[
        probe.meta.get("article:published_time").map(String::as_str),
        probe.meta.get("publisheddate").map(String::as_str),
        probe.meta.get("date").map(String::as_str),
    ]);

    let site_name = first_non_empty(&[
        probe.meta.get("og:site_name").map(String::as_str),
        probe.meta.get("application-name").map(String::as_str),
    ]);

    PageMetadata {
        title,
        description,
        author,
        published,
        site_name,
        captured_at: Utc::now(),
    }
}

fn first_non_empty(candidates: &[Option<&str>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Synthesize a title from the last URL path segment: percent-decoded,
/// hyphens/underscores split into words, each word capitalized.
#[must_use]
pub fn title_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(|s| s.rsplit_once('.').map_or(s, |(stem, _)| stem))
        .filter(|s| !s.is_empty());

    let raw = match segment {
        Some(s) => urlencoding::decode(s)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| s.to_string()),
        None => return url.host_str().unwrap_or("Untitled").to_string(),
    };

    raw.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
