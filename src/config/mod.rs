//! Configuration for site conversion jobs.
//!
//! `SiteConfig` is immutable once built; regex skip patterns are compiled at
//! build time so the frontier filter never compiles in a hot path.

mod builder;
mod getters;
mod types;

pub use builder::SiteConfigBuilder;
pub use types::SiteConfig;

/// URL path patterns excluded from the frontier by default.
///
/// These identify non-content pages (auth, commerce, policy boilerplate,
/// faceted search, pagination) that waste crawl budget.
pub const DEFAULT_SKIP_URL_PATTERNS: &[&str] = &[
    r"/log[-_]?in",
    r"/sign[-_]?(in|up)",
    r"/register",
    r"/account",
    r"/cart",
    r"/checkout",
    r"/privacy",
    r"/terms",
    r"/legal",
    r"/cookie[-_]?policy",
    r"/search\b",
    r"[?&]page=\d+",
    r"/page/\d+",
    r"/tag/",
    r"/feed/?$",
    r"\.(css|js|json|xml|rss|atom|pdf|zip|gz|png|jpe?g|gif|svg|webp|ico|mp[34]|woff2?)$",
];

/// Default desktop user agent presented to crawled sites.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
