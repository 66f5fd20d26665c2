//! Dynamic-content settling.
//!
//! Client-rendered pages keep mutating the DOM after the load event. This
//! module polls a cheap in-page snapshot (text length, element count,
//! main-container text length) until two consecutive snapshots agree within
//! small thresholds, bounding total wait time while giving genuinely dynamic
//! pages a chance to finish rendering.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SNAPSHOT_SCRIPT: &str = r#"
    (() => {
        const mainSelectors = 'main, article, [role="main"], #content, .content';
        const main = document.querySelector(mainSelectors);
        return {
            text_length: document.body ? document.body.innerText.length : 0,
            element_count: document.getElementsByTagName('*').length,
            main_text_length: main ? main.innerText.length : 0
        };
    })()
"#;

/// Tuning for the settle loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StabilizeConfig {
    /// Delay before the first re-snapshot, milliseconds.
    pub initial_delay_ms: u64,
    /// Delay between polling attempts, milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum polling attempts before giving up on stability.
    pub max_attempts: u32,
    /// Extra delay applied when content changed meaningfully, milliseconds.
    pub settle_delay_ms: u64,
    /// Two snapshots within these deltas count as stable.
    pub text_threshold: usize,
    pub element_threshold: usize,
    pub main_text_threshold: usize,
}

impl Default for StabilizeConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 3000,
            poll_interval_ms: 1000,
            max_attempts: 5,
            settle_delay_ms: 1000,
            text_threshold: 50,
            element_threshold: 5,
            main_text_threshold: 50,
        }
    }
}

/// Cheap structural snapshot of the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ContentSnapshot {
    pub text_length: usize,
    pub element_count: usize,
    pub main_text_length: usize,
}

impl ContentSnapshot {
    /// Whether `self` → `next` is within the stability thresholds.
    #[must_use]
    pub fn is_stable(&self, next: &Self, config: &StabilizeConfig) -> bool {
        self.text_length.abs_diff(next.text_length) < config.text_threshold
            && self.element_count.abs_diff(next.element_count) < config.element_threshold
            && self.main_text_length.abs_diff(next.main_text_length) < config.main_text_threshold
    }

    /// Whether the page changed enough since `initial` that its content was
    /// genuinely rendered after load (as opposed to jitter).
    #[must_use]
    pub fn changed_meaningfully(&self, initial: &Self, config: &StabilizeConfig) -> bool {
        !initial.is_stable(self, config)
    }
}

async fn take_snapshot(page: &Page) -> Result<ContentSnapshot> {
    page.evaluate(SNAPSHOT_SCRIPT)
        .await
        .context("Failed to run content snapshot script")?
        .into_value()
        .map_err(|e| anyhow::anyhow!("Failed to read content snapshot: {e}"))
}

/// Wait for client-rendered content to stop changing.
///
/// Returns `true` when the page content changed meaningfully after the
/// initial snapshot, i.e. the page really was dynamic.
pub async fn wait_for_stable(page: &Page, config: &StabilizeConfig) -> Result<bool> {
    let initial = take_snapshot(page).await?;
    tokio::time::sleep(Duration::from_millis(config.initial_delay_ms)).await;

    let mut previous = take_snapshot(page).await?;
    for attempt in 0..config.max_attempts {
        if previous.is_stable(&initial, config) && attempt == 0 {
            // Nothing moved during the initial delay; static page.
            debug!("Content stable immediately, no dynamic rendering detected");
            return Ok(false);
        }

        tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
        let current = take_snapshot(page).await?;

        if previous.is_stable(&current, config) {
            debug!("Content stabilized after {} polling attempts", attempt + 1);
            break;
        }
        previous = current;
    }

    let is_dynamic = previous.changed_meaningfully(&initial, config);
    if is_dynamic {
        // One more settle beat: late-arriving images and fonts often trail
        // the final DOM mutation by a few hundred milliseconds.
        tokio::time::sleep(Duration::from_millis(config.settle_delay_ms)).await;
    }
    Ok(is_dynamic)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(text: usize, elements: usize, main: usize) -> ContentSnapshot {
        ContentSnapshot {
            text_length: text,
            element_count: elements,
            main_text_length: main,
        }
    }

    #[test]
    fn identical_snapshots_are_stable() {
        let config = StabilizeConfig::default();
        let a = snapshot(1000, 200, 800);
        assert!(a.is_stable(&a, &config));
    }

    #[test]
    fn small_jitter_is_stable() {
        let config = StabilizeConfig::default();
        let a = snapshot(1000, 200, 800);
        let b = snapshot(1040, 203, 830);
        assert!(a.is_stable(&b, &config));
    }

    #[test]
    fn text_growth_is_unstable() {
        let config = StabilizeConfig::default();
        let a = snapshot(1000, 200, 800);
        let b = snapshot(1100, 200, 800);
        assert!(!a.is_stable(&b, &config));
    }

    #[test]
    fn element_growth_is_unstable() {
        let config = StabilizeConfig::default();
        let a = snapshot(1000, 200, 800);
        let b = snapshot(1000, 240, 800);
        assert!(!a.is_stable(&b, &config));
    }

    #[test]
    fn framework_hydration_changes_meaningfully() {
        // Empty shell, then a full article renders in.
        let config = StabilizeConfig::default();
        let initial = snapshot(0, 30, 0);
        let settled = snapshot(12_000, 900, 11_000);
        assert!(settled.changed_meaningfully(&initial, &config));
    }

    #[test]
    fn static_page_does_not_change_meaningfully() {
        let config = StabilizeConfig::default();
        let initial = snapshot(12_000, 900, 11_000);
        let settled = snapshot(12_010, 901, 11_005);
        assert!(!settled.changed_meaningfully(&initial, &config));
    }
}
