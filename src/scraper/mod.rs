//! Page retrieval and extraction: shared client, retry policy, selector cascades, and title helpers.

mod client;
mod error;
mod retry;

pub mod chapters;
pub mod images;
pub mod title;

pub use chapters::extract_chapter_links;
pub use client::{
    is_valid_title, page_title, ComicClient, ComicClientBuilder, DEFAULT_BASE_URL,
    ERROR_TITLE_MARKER,
};
pub use error::ScraperError;
pub use images::{extract_image_urls, ImageExtractor};
pub use retry::{Backoff, RetryPolicy};
pub use title::{extract_chapter_title, extract_comic_title};

use scraper::{Html, Selector};
use std::path::Path;

/// Characters that are not allowed in file names on common filesystems.
const ILLEGAL_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_FILE_NAME_CHARS: usize = 100;

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
pub(crate) fn parse_selector(sel: &str) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::Selector {
        selector: sel.to_string(),
        message: e.to_string(),
    })
}

/// Make an image URL absolute: `//host/x` gets `https:`, `/x` gets the site origin.
pub fn normalize_url(src: &str, base_url: &str) -> String {
    if src.starts_with("//") {
        format!("https:{}", src)
    } else if src.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), src)
    } else {
        src.to_string()
    }
}

/// Replace illegal characters with `_`, keep at most 100 characters, and trim.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if ILLEGAL_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .take(MAX_FILE_NAME_CHARS)
        .collect();
    replaced.trim().to_string()
}

/// Parse a saved HTML page from disk. Bytes that are not UTF-8 become U+FFFD.
pub fn parse_local_file(path: &Path) -> Result<Html, ScraperError> {
    let bytes = std::fs::read(path).map_err(|e| ScraperError::io("Cannot read", path, e))?;
    Ok(Html::parse_document(&String::from_utf8_lossy(&bytes)))
}
