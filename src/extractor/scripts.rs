//! In-page extraction scripts.

/// Query all elements matching a selector and report each as a content
/// candidate. The selector is embedded as a JSON string literal so arbitrary
/// selector text cannot break out of the script.
#[must_use]
pub fn content_query_script(selector: &str) -> String {
    let quoted = serde_json::to_string(selector).unwrap_or_else(|_| "\"main\"".to_string());
    format!(
        r#"
        (() => {{
            const selector = {quoted};
            const results = [];
            for (const el of document.querySelectorAll(selector)) {{
                results.push({{
                    html: el.outerHTML,
                    text_length: (el.innerText || '').trim().length,
                    heading_count: el.querySelectorAll('h1,h2,h3,h4,h5,h6').length,
                    paragraph_count: el.querySelectorAll('p').length,
                    list_count: el.querySelectorAll('ul,ol').length
                }});
            }}
            return results;
        }})()
        "#
    )
}

/// Scan generic block-level elements for content-bearing regions, keeping
/// only the topmost candidates (a candidate nested inside another candidate
/// is dropped so combined blocks never duplicate text).
pub const BLOCK_SCAN_SCRIPT: &str = r#"
    (() => {
        const candidates = [];
        for (const el of document.querySelectorAll('div, section, article, main')) {
            const text = (el.innerText || '').trim();
            if (text.length > 100) {
                candidates.push(el);
            }
        }

        const topmost = candidates.filter(el =>
            !candidates.some(other => other !== el && other.contains(el)));

        return topmost.map(el => ({
            html: el.outerHTML,
            text_length: (el.innerText || '').trim().length,
            heading_count: el.querySelectorAll('h1,h2,h3,h4,h5,h6').length,
            paragraph_count: el.querySelectorAll('p').length,
            list_count: el.querySelectorAll('ul,ol').length
        }));
    })()
"#;

/// Collect every non-empty text node under body, for pages with no usable
/// block structure at all.
pub const TEXT_NODES_SCRIPT: &str = r#"
    (() => {
        if (!document.body) return [];
        const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_TEXT);
        const chunks = [];
        let node;
        while ((node = walker.nextNode())) {
            const text = node.textContent.trim();
            if (text.length > 0) {
                chunks.push(text);
            }
        }
        return chunks;
    })()
"#;

/// Full body HTML, the ultimate fallback.
pub const BODY_HTML_SCRIPT: &str = r#"
    (() => document.body ? document.body.outerHTML : '')()
"#;

/// Dump every meta name/property → content pair plus the title and the first
/// h1. Preference rules are applied host-side.
pub const METADATA_SCRIPT: &str = r#"
    (() => {
        const meta = {};
        document.querySelectorAll('meta').forEach(tag => {
            const name = tag.getAttribute('name') || tag.getAttribute('property');
            const content = tag.getAttribute('content');
            if (name && content) {
                meta[name.toLowerCase()] = content;
            }
        });

        const h1 = document.querySelector('h1');
        return {
            meta,
            title: document.title || null,
            first_heading: h1 ? h1.innerText.trim() : null
        };
    })()
"#;

/// Harvest `<img>` records with resolved src; filtering happens host-side.
pub const IMAGES_SCRIPT: &str = r#"
    (() => {
        return Array.from(document.getElementsByTagName('img'))
            .filter(img => img.src)
            .map(img => ({
                src: img.src,
                alt: img.alt || null,
                title: img.title || null,
                width: img.naturalWidth || img.width || null,
                height: img.naturalHeight || img.height || null
            }));
    })()
"#;
