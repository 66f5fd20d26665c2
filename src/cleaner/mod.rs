//! Page cleaning: overlay removal, chrome stripping, SPA detection.
//!
//! All mutation runs in-page via injected scripts; this module owns the
//! scripts, executes them, and interprets their results. The SPA verdict is
//! a pure function over an in-page probe so the thresholds can be tested
//! without a browser.

pub mod scripts;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::Deserialize;
use tracing::debug;

/// Script-count marker above which a page is assumed client-rendered.
const SPA_SCRIPT_COUNT_THRESHOLD: usize = 15;
/// A body smaller than this combined with several scripts suggests a shell
/// document that renders its content client-side.
const SPA_SMALL_BODY_BYTES: usize = 20_000;
const SPA_SMALL_BODY_SCRIPT_THRESHOLD: usize = 5;

/// What the overlay pass did to the page.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OverlayReport {
    #[serde(default)]
    pub clicked: u32,
    #[serde(default)]
    pub removed: u32,
    #[serde(default)]
    pub unlocked: u32,
}

/// What the cleanup pass removed.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CleanupReport {
    #[serde(default)]
    pub scripts: u32,
    #[serde(default)]
    pub styles: u32,
    #[serde(default)]
    pub chrome: u32,
    #[serde(default)]
    pub attributes: u32,
}

/// In-page SPA marker probe.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SpaProbe {
    pub framework_root: bool,
    pub script_count: usize,
    pub body_html_length: usize,
}

/// Observed visual properties of an overlay-removal candidate.
#[derive(Debug, Clone, Copy)]
pub struct OverlayProbe {
    /// Computed position is `fixed` or `absolute`.
    pub positioned: bool,
    /// Computed z-index, when numeric.
    pub z_index: Option<i32>,
    /// Carries `role="dialog"` or `role="alertdialog"`.
    pub dialog_role: bool,
    /// Fraction of the viewport the element covers.
    pub viewport_coverage: f64,
    /// Visible: non-zero opacity, not display:none / visibility:hidden.
    pub visible: bool,
}

/// The overlay-removal gate, as applied by the injected removal script
/// (which shares the thresholds in [`scripts`]): an element is removed only
/// when it is positioned like an overlay, currently visible, and either
/// stacked high, declared as a dialog, or covering most of the viewport.
#[must_use]
pub fn is_overlay_like(probe: &OverlayProbe) -> bool {
    probe.positioned
        && probe.visible
        && (probe
            .z_index
            .is_some_and(|z| z > scripts::OVERLAY_Z_INDEX_THRESHOLD)
            || probe.dialog_role
            || probe.viewport_coverage > scripts::OVERLAY_COVERAGE_THRESHOLD)
}

/// Dismiss and remove overlays (consent banners, modals, chat widgets) and
/// unlock scrolling.
pub async fn remove_overlays(page: &Page) -> Result<OverlayReport> {
    let clicked: serde_json::Value = page
        .evaluate(scripts::CLICK_DISMISS_BUTTONS_SCRIPT)
        .await
        .context("Failed to run dismiss-button script")?
        .into_value()
        .map_err(|e| anyhow::anyhow!("Failed to read dismiss-button result: {e}"))?;

    let removed: serde_json::Value = page
        .evaluate(scripts::remove_overlays_script())
        .await
        .context("Failed to run overlay-removal script")?
        .into_value()
        .map_err(|e| anyhow::anyhow!("Failed to read overlay-removal result: {e}"))?;

    let report = OverlayReport {
        clicked: clicked.get("clicked").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        removed: removed.get("removed").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        unlocked: removed.get("unlocked").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
    };
    debug!(
        "Overlay pass: clicked={} removed={} unlocked={}",
        report.clicked, report.removed, report.unlocked
    );
    Ok(report)
}

/// Remove scripts, styles, page chrome and inline event handlers.
pub async fn cleanup_page(page: &Page) -> Result<CleanupReport> {
    let report: CleanupReport = page
        .evaluate(scripts::CLEANUP_PAGE_SCRIPT)
        .await
        .context("Failed to run cleanup script")?
        .into_value()
        .map_err(|e| anyhow::anyhow!("Failed to read cleanup result: {e}"))?;

    debug!(
        "Cleanup pass: scripts={} styles={} chrome={} attributes={}",
        report.scripts, report.styles, report.chrome, report.attributes
    );
    Ok(report)
}

/// Whether the page looks like a Single-Page Application that renders its
/// content client-side.
pub async fn detect_spa(page: &Page) -> Result<bool> {
    let probe: SpaProbe = page
        .evaluate(scripts::SPA_PROBE_SCRIPT)
        .await
        .context("Failed to run SPA probe")?
        .into_value()
        .map_err(|e| anyhow::anyhow!("Failed to read SPA probe: {e}"))?;

    let verdict = classify_spa(&probe);
    debug!(
        "SPA probe: framework_root={} scripts={} body={}B -> {}",
        probe.framework_root, probe.script_count, probe.body_html_length, verdict
    );
    Ok(verdict)
}

/// SPA classification over a probe.
///
/// A page is considered an SPA when it carries a framework root marker, is
/// unusually script-heavy, or pairs a small server-rendered body with more
/// than a handful of scripts.
#[must_use]
pub fn classify_spa(probe: &SpaProbe) -> bool {
    probe.framework_root
        || probe.script_count > SPA_SCRIPT_COUNT_THRESHOLD
        || (probe.body_html_length < SPA_SMALL_BODY_BYTES
            && probe.script_count > SPA_SMALL_BODY_SCRIPT_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_viewport_consent_banner_is_removed() {
        // position:absolute, z-index 9999, covers the viewport.
        let probe = OverlayProbe {
            positioned: true,
            z_index: Some(9999),
            dialog_role: false,
            viewport_coverage: 1.0,
            visible: true,
        };
        assert!(is_overlay_like(&probe));
    }

    #[test]
    fn relative_nav_inside_main_survives() {
        // position:relative never qualifies, whatever its class names say.
        let probe = OverlayProbe {
            positioned: false,
            z_index: Some(9999),
            dialog_role: true,
            viewport_coverage: 1.0,
            visible: true,
        };
        assert!(!is_overlay_like(&probe));
    }

    #[test]
    fn hidden_elements_are_left_alone() {
        let probe = OverlayProbe {
            positioned: true,
            z_index: Some(100),
            dialog_role: false,
            viewport_coverage: 0.8,
            visible: false,
        };
        assert!(!is_overlay_like(&probe));
    }

    #[test]
    fn low_stacked_small_positioned_element_survives() {
        // A small absolutely-positioned tooltip with modest z-index.
        let probe = OverlayProbe {
            positioned: true,
            z_index: Some(2),
            dialog_role: false,
            viewport_coverage: 0.01,
            visible: true,
        };
        assert!(!is_overlay_like(&probe));
    }

    #[test]
    fn dialog_role_qualifies_without_z_index() {
        let probe = OverlayProbe {
            positioned: true,
            z_index: None,
            dialog_role: true,
            viewport_coverage: 0.2,
            visible: true,
        };
        assert!(is_overlay_like(&probe));
    }

    #[test]
    fn framework_root_is_spa() {
        let probe = SpaProbe {
            framework_root: true,
            script_count: 0,
            body_html_length: 500_000,
        };
        assert!(classify_spa(&probe));
    }

    #[test]
    fn script_heavy_page_is_spa() {
        let probe = SpaProbe {
            framework_root: false,
            script_count: 16,
            body_html_length: 500_000,
        };
        assert!(classify_spa(&probe));
    }

    #[test]
    fn small_body_with_scripts_is_spa() {
        let probe = SpaProbe {
            framework_root: false,
            script_count: 6,
            body_html_length: 4_000,
        };
        assert!(classify_spa(&probe));
    }

    #[test]
    fn static_article_is_not_spa() {
        let probe = SpaProbe {
            framework_root: false,
            script_count: 3,
            body_html_length: 80_000,
        };
        assert!(!classify_spa(&probe));
    }

    #[test]
    fn small_static_page_is_not_spa() {
        // Small body alone is not enough; it needs the script count too.
        let probe = SpaProbe {
            framework_root: false,
            script_count: 2,
            body_html_length: 3_000,
        };
        assert!(!classify_spa(&probe));
    }
}
