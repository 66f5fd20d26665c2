//! Output archive assembly.
//!
//! Builds the index document, derives collision-resistant file and folder
//! names, and packages everything into a [`SiteArchive`]. Results arrive in
//! completion order, so grouping happens here, after the fact.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use url::Url;

use super::types::{ArchiveFile, CrawlStats, PageResult, SiteArchive};

/// Index file name; always the first archive entry.
pub const INDEX_FILE_NAME: &str = "index.md";

/// Derive a Markdown file name from a page URL: path segments joined with
/// hyphens, sanitized, numeric suffix on collision. The site root becomes
/// `home.md` (`index.md` is reserved for the archive index).
#[must_use]
pub fn page_file_name(url: &str, taken: &mut HashSet<String>) -> String {
    let stem = Url::parse(url)
        .ok()
        .map(|parsed| {
            let joined = parsed
                .path_segments()
                .map(|segments| {
                    segments
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                        .join("-")
                })
                .unwrap_or_default();
            let joined = joined.trim_end_matches(".html").trim_end_matches(".htm");
            if joined.is_empty() {
                "home".to_string()
            } else {
                joined.to_string()
            }
        })
        .unwrap_or_else(|| "page".to_string());

    let stem = sanitize_filename::sanitize(&stem);
    let stem = if stem.is_empty() { "page".to_string() } else { stem };

    let mut candidate = format!("{stem}.md");
    let mut counter = 2;
    while !taken.insert(candidate.clone()) || candidate == INDEX_FILE_NAME {
        candidate = format!("{stem}-{counter}.md");
        counter += 1;
    }
    candidate
}

/// Collision-avoided output folder name: `host_YYYY-MM-DD_HHMMSS`, with a
/// numeric suffix when the caller already holds a folder by that name.
#[must_use]
pub fn unique_folder_name(host: &str, now: DateTime<Utc>, taken: &HashSet<String>) -> String {
    let base = sanitize_filename::sanitize(format!(
        "{host}_{}",
        now.format("%Y-%m-%d_%H%M%S")
    ));
    if !taken.contains(&base) {
        return base;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// First path segment used to group index entries; the site root and
/// top-level pages group under "Root".
fn section_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed.path_segments().and_then(|segments| {
                let parts: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
                if parts.len() > 1 {
                    Some(parts[0].to_string())
                } else {
                    None
                }
            })
        })
        .unwrap_or_else(|| "Root".to_string())
}

/// Build the index document: site name, source, timestamp, statistics,
/// successful pages grouped by first path segment, failures with reasons.
#[must_use]
pub fn build_index(
    seed_url: &str,
    host: &str,
    results: &[PageResult],
    file_names: &[(String, String)],
    now: DateTime<Utc>,
) -> String {
    let stats = compute_stats(results);
    let mut out = String::new();

    out.push_str(&format!("# {host}\n\n"));
    out.push_str(&format!("Source: {seed_url}\n\n"));
    out.push_str(&format!(
        "Archived: {}\n\n",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "Pages: {} total, {} converted, {} failed\n",
        stats.total_pages, stats.successful_pages, stats.failed_pages
    ));

    // Group successes by section regardless of completion order.
    let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    for result in results.iter().filter(|r| r.success) {
        let title = result
            .metadata
            .as_ref()
            .map(|m| m.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| result.url.clone());
        let file = file_names
            .iter()
            .find(|(url, _)| *url == result.url)
            .map(|(_, name)| name.clone())
            .unwrap_or_default();
        sections
            .entry(section_of(&result.url))
            .or_default()
            .push((title, file));
    }

    if !sections.is_empty() {
        out.push_str("\n## Pages\n");
        // Root entries lead; remaining sections alphabetical via BTreeMap.
        if let Some(mut entries) = sections.remove("Root") {
            entries.sort();
            out.push('\n');
            for (title, file) in entries {
                out.push_str(&index_line(&title, &file));
            }
        }
        for (section, mut entries) in sections {
            entries.sort();
            out.push_str(&format!("\n### {section}\n\n"));
            for (title, file) in entries {
                out.push_str(&index_line(&title, &file));
            }
        }
    }

    let failures: Vec<&PageResult> = results.iter().filter(|r| !r.success).collect();
    if !failures.is_empty() {
        out.push_str("\n## Failed pages\n\n");
        for failure in failures {
            out.push_str(&format!(
                "- {}: {}\n",
                failure.url,
                failure.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    out
}

fn index_line(title: &str, file: &str) -> String {
    let stem = file.strip_suffix(".md").unwrap_or(file);
    if stem.is_empty() {
        format!("- {title}\n")
    } else if stem == title {
        format!("- [[{stem}]]\n")
    } else {
        format!("- [[{stem}|{title}]]\n")
    }
}

#[must_use]
pub fn compute_stats(results: &[PageResult]) -> CrawlStats {
    let successful = results.iter().filter(|r| r.success).count();
    CrawlStats {
        total_pages: results.len(),
        successful_pages: successful,
        failed_pages: results.len() - successful,
    }
}

/// Package results into the final archive: index first, one file per
/// successful page, stats, and a collision-avoided folder name.
#[must_use]
pub fn assemble_archive(
    seed_url: &str,
    host: &str,
    results: &[PageResult],
    now: DateTime<Utc>,
    taken_folders: &HashSet<String>,
) -> SiteArchive {
    let mut taken_files = HashSet::new();
    taken_files.insert(INDEX_FILE_NAME.to_string());

    let file_names: Vec<(String, String)> = results
        .iter()
        .filter(|r| r.success)
        .map(|r| (r.url.clone(), page_file_name(&r.url, &mut taken_files)))
        .collect();

    let index = build_index(seed_url, host, results, &file_names, now);

    let mut files = Vec::with_capacity(file_names.len() + 1);
    files.push(ArchiveFile::text(INDEX_FILE_NAME, index.clone()));
    for result in results.iter().filter(|r| r.success) {
        let name = file_names
            .iter()
            .find(|(url, _)| *url == result.url)
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| "page.md".to_string());
        files.push(ArchiveFile::text(
            name,
            result.content.clone().unwrap_or_default(),
        ));
    }

    SiteArchive {
        url: seed_url.to_string(),
        name: host.to_string(),
        content: index,
        files,
        success: true,
        stats: compute_stats(results),
        folder_name: unique_folder_name(host, now, taken_folders),
    }
}
