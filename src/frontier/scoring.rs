//! Link priority scoring.
//!
//! The policy is a declarative signal table folded into a score, so each
//! signal can be tested and tuned on its own instead of living inside
//! branching code.

use regex::Regex;
use std::sync::LazyLock;

/// Everything the scorer knows about one discovered link.
#[derive(Debug, Clone)]
pub struct LinkObservation {
    /// Normalized URL path.
    pub path: String,
    /// Whether an ancestor is a navigation container
    /// (`nav`/`.nav`/`.menu`/`header`).
    pub in_nav: bool,
    /// Whether an ancestor is a main-content container
    /// (`main`/`article`/`.content`/`#content`).
    pub in_content: bool,
}

impl LinkObservation {
    /// Number of non-empty path segments.
    #[must_use]
    pub fn path_depth(&self) -> usize {
        self.path.split('/').filter(|s| !s.is_empty()).count()
    }
}

/// One scoring signal: `weight × count(observation)` is added to the score.
pub struct Signal {
    pub name: &'static str,
    pub weight: i32,
    pub count: fn(&LinkObservation) -> i32,
}

static KEY_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(about|contact|docs)(/|$)").expect("BUG: key-section regex is invalid")
});

/// Base score before signals apply.
pub const BASE_SCORE: i32 = 50;

/// The scoring table.
///
/// | signal            | weight | counts                       |
/// |-------------------|--------|------------------------------|
/// | content-container |   +30  | ancestor is main content     |
/// | navigation        |   +20  | ancestor is site navigation  |
/// | path-depth        |    -5  | per path segment             |
/// | home-page         |   +50  | path is `/` or `/index.html` |
/// | key-section       |   +40  | path under about/contact/docs|
pub const SIGNALS: &[Signal] = &[
    Signal {
        name: "content-container",
        weight: 30,
        count: |o| i32::from(o.in_content),
    },
    Signal {
        name: "navigation",
        weight: 20,
        count: |o| i32::from(o.in_nav),
    },
    Signal {
        name: "path-depth",
        weight: -5,
        count: |o| o.path_depth() as i32,
    },
    Signal {
        name: "home-page",
        weight: 50,
        count: |o| i32::from(o.path == "/" || o.path == "/index.html"),
    },
    Signal {
        name: "key-section",
        weight: 40,
        count: |o| i32::from(KEY_SECTION.is_match(&o.path)),
    },
];

/// Fold the signal table into a priority score.
#[must_use]
pub fn score_link(observation: &LinkObservation) -> i32 {
    SIGNALS.iter().fold(BASE_SCORE, |score, signal| {
        score + signal.weight * (signal.count)(observation)
    })
}
