//! In-page link harvesting.

/// Collect every `<a href>` with the ancestry flags the scorer needs.
/// `resolved` uses the browser's own URL resolution (`a.href`), so relative
/// links arrive absolute.
pub const HARVEST_LINKS_SCRIPT: &str = r#"
    (() => {
        return Array.from(document.querySelectorAll('a[href]')).map(a => ({
            href: a.getAttribute('href') || '',
            resolved: a.href || '',
            in_nav: a.closest('nav, .nav, .menu, header') !== null,
            in_content: a.closest('main, article, .content, #content') !== null
        }));
    })()
"#;
