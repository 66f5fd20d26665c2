//! In-page DOM mutation scripts.
//!
//! Each script is a self-contained IIFE returning a serializable summary so
//! the host side can log what happened. The policy (which selectors, which
//! thresholds) lives here; the decisions driven by the results live in
//! host-language code.

/// Click common "accept"/"close"/"dismiss" buttons before removing overlays,
/// so sites that set a consent cookie stop re-rendering the banner.
pub const CLICK_DISMISS_BUTTONS_SCRIPT: &str = r#"
    (() => {
        const patterns = [
            '[aria-label*="close" i]',
            '[aria-label*="dismiss" i]',
            '[aria-label*="accept" i]',
            '[title*="close" i]',
            'button[class*="close" i]',
            'button[class*="dismiss" i]',
            'button[class*="accept" i]',
            'button[id*="accept" i]',
            'button[id*="close" i]',
            '.cookie-accept, .accept-cookies, .cc-dismiss, .cc-accept'
        ];

        let clicked = 0;
        for (const pattern of patterns) {
            for (const el of document.querySelectorAll(pattern)) {
                const rect = el.getBoundingClientRect();
                if (rect.width === 0 || rect.height === 0) continue;
                try {
                    el.click();
                    clicked++;
                } catch (e) {
                    // Detached or guarded element; skip it.
                }
            }
        }
        return { clicked };
    })()
"#;

/// z-index above which a positioned element counts as overlay-like.
pub const OVERLAY_Z_INDEX_THRESHOLD: i32 = 10;
/// Fraction of the viewport an element must cover to count as overlay-like
/// without a high z-index or dialog role.
pub const OVERLAY_COVERAGE_THRESHOLD: f64 = 0.5;

/// Remove overlay-like elements and restore page scrollability.
///
/// Removal is gated on the element actually behaving like an overlay;
/// see [`is_overlay_like`](super::is_overlay_like) for the policy the
/// injected code applies. A relatively-positioned nav that happens to carry
/// a "banner" class survives.
#[must_use]
pub fn remove_overlays_script() -> String {
    REMOVE_OVERLAYS_TEMPLATE
        .replace("__Z_INDEX__", &OVERLAY_Z_INDEX_THRESHOLD.to_string())
        .replace("__COVERAGE__", &OVERLAY_COVERAGE_THRESHOLD.to_string())
}

const REMOVE_OVERLAYS_TEMPLATE: &str = r#"
    (() => {
        const overlaySelectors = [
            '[class*="cookie" i]', '[id*="cookie" i]',
            '[class*="consent" i]', '[id*="consent" i]',
            '[class*="gdpr" i]', '[id*="gdpr" i]',
            '[class*="popup" i]', '[class*="modal" i]',
            '[class*="overlay" i]', '[class*="banner" i]',
            '[class*="newsletter" i]', '[class*="paywall" i]',
            '[class*="chat-widget" i]', '[id*="intercom" i]',
            '[id*="drift-widget" i]', '[class*="interstitial" i]'
        ];

        const isOverlayLike = (el) => {
            const style = window.getComputedStyle(el);
            if (style.position !== 'fixed' && style.position !== 'absolute') {
                return false;
            }
            if (style.display === 'none' || style.visibility === 'hidden') {
                return false;
            }
            if (parseFloat(style.opacity || '1') === 0) {
                return false;
            }

            const zIndex = parseInt(style.zIndex, 10);
            const highZ = !isNaN(zIndex) && zIndex > __Z_INDEX__;
            const role = el.getAttribute('role');
            const dialogRole = role === 'dialog' || role === 'alertdialog';
            const rect = el.getBoundingClientRect();
            const coverage = (rect.width * rect.height) /
                (window.innerWidth * window.innerHeight || 1);

            return highZ || dialogRole || coverage > __COVERAGE__;
        };

        let removed = 0;
        const seen = new Set();
        for (const selector of overlaySelectors) {
            for (const el of document.querySelectorAll(selector)) {
                if (seen.has(el)) continue;
                seen.add(el);
                if (isOverlayLike(el)) {
                    el.remove();
                    removed++;
                }
            }
        }

        // Overlay libraries lock scrolling on body/html; the page stays
        // frozen after removal unless the locks go too.
        let unlocked = 0;
        for (const el of [document.documentElement, document.body]) {
            if (!el) continue;
            for (const cls of Array.from(el.classList)) {
                if (/no-?scroll|modal-open|overflow-hidden|scroll-lock/i.test(cls)) {
                    el.classList.remove(cls);
                    unlocked++;
                }
            }
            if (el.style.overflow === 'hidden') {
                el.style.overflow = '';
                unlocked++;
            }
            if (el.style.position === 'fixed') {
                el.style.position = '';
                unlocked++;
            }
        }

        return { removed, unlocked };
    })()
"#;

/// Strip scripts, styles, chrome and event handlers from the page.
///
/// Non-content containers survive when nested inside a recognized
/// main-content container so in-article navigation is preserved.
pub const CLEANUP_PAGE_SCRIPT: &str = r#"
    (() => {
        const summary = { scripts: 0, styles: 0, chrome: 0, attributes: 0 };

        for (const el of document.querySelectorAll('script, style, link[rel="stylesheet"]')) {
            if (el.tagName === 'SCRIPT') summary.scripts++;
            else summary.styles++;
            el.remove();
        }

        const mainSelectors = 'main, article, [role="main"], #content, .content, #main-content, .main-content';
        const chromeSelectors = [
            'nav', 'header', 'footer', 'aside',
            '.sidebar', '#sidebar', '.site-header', '.site-footer',
            '.comments', '#comments', '.comment-section',
            '.social-share', '.share-buttons',
            '.ads', '.advertisement', '[class*="ad-container" i]',
            '.related-posts', 'iframe'
        ];

        for (const selector of chromeSelectors) {
            for (const el of document.querySelectorAll(selector)) {
                if (el.closest(mainSelectors)) continue;
                el.remove();
                summary.chrome++;
            }
        }

        for (const el of document.querySelectorAll('*')) {
            if (el.hasAttribute('style')) {
                el.removeAttribute('style');
                summary.attributes++;
            }
            for (const attr of Array.from(el.attributes)) {
                if (attr.name.startsWith('on')) {
                    el.removeAttribute(attr.name);
                    summary.attributes++;
                }
            }
        }

        return summary;
    })()
"#;

/// Probe for Single-Page-Application markers; classification happens
/// host-side so the thresholds stay unit-testable.
pub const SPA_PROBE_SCRIPT: &str = r#"
    (() => {
        const rootSelectors = [
            '#root', '#app', '#__next', '#___gatsby',
            '[data-reactroot]', '[data-reactid]',
            '[ng-app]', '[ng-controller]', '[data-ng-app]',
            '[data-v-app]', '#q-app', '#svelte'
        ];

        const frameworkRoot = rootSelectors.some(s => document.querySelector(s) !== null);
        const scriptCount = document.getElementsByTagName('script').length;
        const bodyHtmlLength = document.body ? document.body.innerHTML.length : 0;

        return {
            framework_root: frameworkRoot,
            script_count: scriptCount,
            body_html_length: bodyHtmlLength
        };
    })()
"#;
