//! robots.txt sitemap hints.
//!
//! Only `Sitemap:` directives are read; disallow rules are intentionally not
//! honored (robots.txt is a discovery hint here, not an exclusion contract).

/// Extract every `Sitemap:` directive, case-insensitively.
#[must_use]
pub fn sitemap_urls_from_robots(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| {
            let line = line.trim();
            let (key, value) = line.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect()
}
