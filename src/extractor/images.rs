//! Host-side image filtering.
//!
//! The in-page harvest returns every `<img>`; this pass keeps only sources
//! that plausibly point at real images: a known file extension, a trusted
//! image-CDN host, or recognizable image-serving query parameters.

use tracing::debug;
use url::Url;

use super::schema::{PageImage, RawImage};

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "avif", "bmp", "ico",
];

/// Hosts that serve images without an extension in the path.
const TRUSTED_IMAGE_HOSTS: &[&str] = &[
    "images.unsplash.com",
    "res.cloudinary.com",
    "imgix.net",
    "images.ctfassets.net",
    "i.imgur.com",
    "avatars.githubusercontent.com",
    "raw.githubusercontent.com",
    "gravatar.com",
    "wp.com",
];

/// Query parameters typical of image-resizing services.
const IMAGE_QUERY_PARAMS: &[&str] = &["format", "fm", "auto", "fit", "crop", "w", "h", "dpr"];

/// Whether a resolved image URL looks like an actual image.
#[must_use]
pub fn looks_like_image(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    if let Some(ext) = path.rsplit('.').next()
        && path.contains('.')
        && IMAGE_EXTENSIONS.contains(&ext)
    {
        return true;
    }

    if let Some(host) = url.host_str() {
        let host = host.to_ascii_lowercase();
        if TRUSTED_IMAGE_HOSTS
            .iter()
            .any(|trusted| host == *trusted || host.ends_with(&format!(".{trusted}")))
        {
            return true;
        }
    }

    url.query_pairs()
        .any(|(key, _)| IMAGE_QUERY_PARAMS.contains(&key.as_ref()))
}

/// Resolve raw `<img>` records against the page URL and keep the plausible
/// ones. Unresolvable sources are dropped, not errored.
#[must_use]
pub fn filter_images(raw: Vec<RawImage>, base: &Url) -> Vec<PageImage> {
    let total = raw.len();
    let kept: Vec<PageImage> = raw
        .into_iter()
        .filter_map(|img| {
            let resolved = base.join(&img.src).ok()?;
            if !matches!(resolved.scheme(), "http" | "https") {
                return None;
            }
            looks_like_image(&resolved).then(|| PageImage {
                src: resolved.to_string(),
                alt: img.alt.filter(|s| !s.is_empty()),
                title: img.title.filter(|s| !s.is_empty()),
                width: img.width,
                height: img.height,
            })
        })
        .collect();

    debug!("Kept {}/{} harvested images", kept.len(), total);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn extension_match() {
        assert!(looks_like_image(&url("https://example.com/pic.png")));
        assert!(looks_like_image(&url("https://example.com/a/b/photo.JPEG")));
        assert!(!looks_like_image(&url("https://example.com/page.html")));
    }

    #[test]
    fn trusted_cdn_without_extension() {
        assert!(looks_like_image(&url(
            "https://images.unsplash.com/photo-12345"
        )));
        assert!(looks_like_image(&url(
            "https://res.cloudinary.com/demo/image/upload/sample"
        )));
    }

    #[test]
    fn image_serving_query_params() {
        assert!(looks_like_image(&url(
            "https://cdn.example.com/asset?format=webp&w=800"
        )));
        assert!(!looks_like_image(&url(
            "https://cdn.example.com/asset?session=abc"
        )));
    }

    #[test]
    fn filter_resolves_relative_srcs() {
        let base = url("https://example.com/blog/post");
        let raw = vec![
            RawImage {
                src: "/img/hero.webp".into(),
                alt: Some("Hero".into()),
                title: None,
                width: Some(1200),
                height: Some(600),
            },
            RawImage {
                src: "data:image/png;base64,AAAA".into(),
                alt: None,
                title: None,
                width: None,
                height: None,
            },
        ];
        let kept = filter_images(raw, &base);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].src, "https://example.com/img/hero.webp");
        assert_eq!(kept[0].alt.as_deref(), Some("Hero"));
    }
}
