//! Shared error type for page fetching, extraction, and image downloads.

use std::path::PathBuf;
use thiserror::Error;

/// Scraper error for URL handling, HTTP, decoding, page validation, and local files.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        /// First bytes of the response body, for diagnosis.
        body: String,
    },

    #[error("Could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Page parsed but its title is empty or marks an error page.
    #[error("Page at {url} looks incomplete (title: {title:?})")]
    InvalidPage { url: String, title: String },

    #[error("Invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No image links found on {0} (selectors may need updating)")]
    NoImages(String),

    #[error("No chapter links found on {0}")]
    NoChapters(String),

    #[error("Still failing after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ScraperError>,
    },

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ScraperError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScraperError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
