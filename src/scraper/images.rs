//! Image-URL extraction from a chapter page. Three extractors are tried in order; the first
//! that finds anything wins.

use crate::scraper::error::ScraperError;
use crate::scraper::{normalize_url, parse_selector};
use scraper::{ElementRef, Html};
use tracing::debug;

/// Substrings that mark an `<img>` URL as a comic page rather than site chrome.
const COMIC_PATH_MARKERS: &[&str] = &["upload", "book", "imgBridge", "imgs", "comic"];
const COMIC_IMAGE_SUFFIXES: &[&str] = &[".jpg", ".png", ".jpeg"];

/// One strategy for finding raw image URLs in a document.
pub trait ImageExtractor {
    fn name(&self) -> &'static str;

    /// Raw (trimmed, not yet normalized) candidate URLs in document order.
    fn candidates(&self, doc: &Html) -> Result<Vec<String>, ScraperError>;
}

/// `img.lazy[data-original]`, the site's own lazy loader.
pub struct LazyImages;

/// Any `<img>`, first of `data-original`, `data-src`, `src`, filtered to comic-looking URLs.
pub struct GenericImages;

/// `div.cropped` containers carrying `data-src` or `src`.
pub struct CroppedContainers;

/// Cascade order.
pub const EXTRACTORS: &[&dyn ImageExtractor] = &[&LazyImages, &GenericImages, &CroppedContainers];

/// First attribute in `names` that is present on the element, even if empty.
fn first_attr<'a>(el: &ElementRef<'a>, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|n| el.value().attr(n))
}

impl ImageExtractor for LazyImages {
    fn name(&self) -> &'static str {
        "img.lazy"
    }

    fn candidates(&self, doc: &Html) -> Result<Vec<String>, ScraperError> {
        let sel = parse_selector("img.lazy")?;
        Ok(doc
            .select(&sel)
            .filter_map(|el| el.value().attr("data-original"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect())
    }
}

fn looks_like_comic_image(src: &str) -> bool {
    COMIC_PATH_MARKERS.iter().any(|m| src.contains(m))
        || COMIC_IMAGE_SUFFIXES.iter().any(|s| src.ends_with(s))
}

impl ImageExtractor for GenericImages {
    fn name(&self) -> &'static str {
        "img"
    }

    fn candidates(&self, doc: &Html) -> Result<Vec<String>, ScraperError> {
        let sel = parse_selector("img")?;
        Ok(doc
            .select(&sel)
            .filter_map(|el| first_attr(&el, &["data-original", "data-src", "src"]))
            .map(str::trim)
            .filter(|s| !s.is_empty() && looks_like_comic_image(s))
            .map(String::from)
            .collect())
    }
}

impl ImageExtractor for CroppedContainers {
    fn name(&self) -> &'static str {
        "div.cropped"
    }

    fn candidates(&self, doc: &Html) -> Result<Vec<String>, ScraperError> {
        let sel = parse_selector("div.cropped")?;
        Ok(doc
            .select(&sel)
            .filter_map(|el| first_attr(&el, &["data-src", "src"]))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect())
    }
}

/// Run `extractors` in order, stopping at the first non-empty result, and normalize the URLs
/// against `base_url`. An empty result is not an error.
pub fn extract_with(
    doc: &Html,
    base_url: &str,
    extractors: &[&dyn ImageExtractor],
) -> Result<Vec<String>, ScraperError> {
    for extractor in extractors {
        let found = extractor.candidates(doc)?;
        if !found.is_empty() {
            debug!("{} image(s) via {}", found.len(), extractor.name());
            return Ok(found
                .iter()
                .map(|src| normalize_url(src, base_url))
                .collect());
        }
        debug!("no images via {}", extractor.name());
    }
    Ok(Vec::new())
}

/// Image URLs from a chapter page using the default cascade.
pub fn extract_image_urls(doc: &Html, base_url: &str) -> Result<Vec<String>, ScraperError> {
    extract_with(doc, base_url, EXTRACTORS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.92hm.life";

    fn urls(html: &str) -> Vec<String> {
        extract_image_urls(&Html::parse_document(html), BASE).unwrap()
    }

    #[test]
    fn lazy_images_win_and_keep_order() {
        let html = r#"<html><body>
            <img class="lazy" data-original="https://cdn.example.com/a.jpg">
            <img src="/static/upload/other.jpg">
            <img class="lazy" data-original=" //cdn.example.com/b.jpg ">
            <img class="lazy" data-original="/upload/c.jpg">
        </body></html>"#;
        assert_eq!(
            urls(html),
            vec![
                "https://cdn.example.com/a.jpg",
                "https://cdn.example.com/b.jpg",
                "https://www.92hm.life/upload/c.jpg",
            ]
        );
    }

    #[test]
    fn lazy_images_without_data_original_are_skipped() {
        let html = r#"<img class="lazy" src="/upload/x.jpg"><img class="lazy" data-original="">"#;
        // Falls through to generic <img>, which reads src.
        assert_eq!(urls(html), vec!["https://www.92hm.life/upload/x.jpg"]);
    }

    #[test]
    fn generic_images_filter_by_marker_or_extension() {
        let html = r#"<body>
            <img src="/static/logo.svg">
            <img data-src="https://img.example.com/imgs/1">
            <img src="https://x.example.com/page2.png">
            <img src="https://x.example.com/banner.gif">
            <img data-original="//img.example.com/comic/3.webp" src="/ignored.jpg">
        </body>"#;
        assert_eq!(
            urls(html),
            vec![
                "https://img.example.com/imgs/1",
                "https://x.example.com/page2.png",
                "https://img.example.com/comic/3.webp",
            ]
        );
    }

    #[test]
    fn generic_first_present_attribute_wins_even_if_empty() {
        // data-original present but empty: src is not consulted.
        let html = r#"<img data-original="" src="/upload/1.jpg">"#;
        assert!(urls(html).is_empty());
    }

    #[test]
    fn cropped_containers_are_last_resort() {
        let html = r#"<div class="cropped" data-src="/p/1"></div><div class="cropped" src="//cdn/p/2"></div>"#;
        assert_eq!(
            urls(html),
            vec!["https://www.92hm.life/p/1", "https://cdn/p/2"]
        );
    }

    #[test]
    fn no_matches_anywhere_is_empty_not_error() {
        let html = r#"<html><head><title>Nothing</title></head><body><p>no images</p><img src="/logo.svg"></body></html>"#;
        assert!(urls(html).is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let html = r#"<img class="lazy" data-original="/a.jpg"><img class="lazy" data-original="/a.jpg">"#;
        assert_eq!(urls(html).len(), 2);
    }

    #[test]
    fn custom_cascade_order_is_respected() {
        let html = r#"<img class="lazy" data-original="/a.jpg"><div class="cropped" data-src="/b"></div>"#;
        let doc = Html::parse_document(html);
        let cascade: [&dyn ImageExtractor; 2] = [&CroppedContainers, &LazyImages];
        let found = extract_with(&doc, BASE, &cascade).unwrap();
        assert_eq!(found, vec!["https://www.92hm.life/b"]);
    }
}
