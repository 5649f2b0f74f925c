//! Blocking HTTP client that impersonates a desktop browser, validates fetched pages, and streams images to disk.

use crate::config::Verbosity;
use crate::scraper::error::ScraperError;
use crate::scraper::retry::RetryPolicy;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use scraper::Html;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.92hm.life";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_REDIRECTS: usize = 10;

const DEFAULT_PAGE_ATTEMPTS: u32 = 3;
const DEFAULT_PAGE_RETRY_DELAY_SECS: u64 = 5;
const DEFAULT_IMAGE_ATTEMPTS: u32 = 3;
const DEFAULT_IMAGE_RETRY_DELAY_SECS: u64 = 2;

/// Substring of the page title the site uses on its error pages.
pub const ERROR_TITLE_MARKER: &str = "错误";

/// Bytes of a non-200 body kept in the error message.
const ERROR_BODY_LIMIT: u64 = 1024;

const PAGE_HEADERS: &[(&str, &str)] = &[
    ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"),
    ("accept-language", "zh-CN,zh;q=0.9,en;q=0.8"),
    ("accept-encoding", "gzip, deflate, br"),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-user", "?1"),
    ("cache-control", "max-age=0"),
];

const IMAGE_HEADERS: &[(&str, &str)] = &[
    ("accept", "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8"),
    ("accept-language", "zh-CN,zh;q=0.9,en;q=0.8"),
    ("accept-encoding", "gzip, deflate, br"),
    ("connection", "keep-alive"),
    ("sec-fetch-dest", "image"),
    ("sec-fetch-mode", "no-cors"),
    ("sec-fetch-site", "cross-site"),
];

/// Client for the comic site. Pages and images use separate inner clients because their
/// headers and accepted encodings differ (images are never Brotli-decoded).
#[derive(Debug)]
pub struct ComicClient {
    pages: Client,
    images: Client,
    base_url: String,
    page_retry: RetryPolicy,
    image_retry: RetryPolicy,
    verbosity: Verbosity,
}

impl ComicClient {
    /// Build a client with the default origin, headers, timeout, and retry policies.
    pub fn new() -> Result<Self, ScraperError> {
        Self::builder().build()
    }

    pub fn builder() -> ComicClientBuilder {
        ComicClientBuilder::default()
    }

    /// Site origin without trailing slash, e.g. `https://www.92hm.life`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn chapter_url(&self, chapter_id: &str) -> String {
        format!("{}/chapter/{}", self.base_url, chapter_id)
    }

    pub fn book_url(&self, series_id: &str) -> String {
        format!("{}/book/{}", self.base_url, series_id)
    }

    /// One attempt: GET, check status, decode, parse, and validate the page title.
    pub fn fetch_page(&self, url: &str) -> Result<Html, ScraperError> {
        debug!("requesting {}", url);
        if self.verbosity.is_debug() {
            for &(name, value) in PAGE_HEADERS {
                debug!("  {}: {}", name, value);
            }
        }
        let response = self
            .pages
            .get(url)
            .send()
            .map_err(|e| ScraperError::Network {
                url: url.to_string(),
                source: e,
            })?;
        log_response(&response, self.verbosity);
        let response = check_status(response, url)?;

        let body = response.text().map_err(|e| ScraperError::Decode {
            url: url.to_string(),
            source: e,
        })?;
        debug!("response body: {} bytes", body.len());

        let doc = Html::parse_document(&body);
        let title = page_title(&doc);
        debug!("page title: {:?}", title);
        if !is_valid_title(&title) {
            return Err(ScraperError::InvalidPage {
                url: url.to_string(),
                title,
            });
        }
        Ok(doc)
    }

    /// [fetch_page](Self::fetch_page) wrapped in the page retry policy.
    pub fn fetch_page_with_retry(&self, url: &str) -> Result<Html, ScraperError> {
        let policy = self.page_retry;
        policy
            .run(
                |attempt| {
                    if self.verbosity.shows_progress() {
                        println!(
                            "Fetching page (attempt {}/{})...",
                            attempt,
                            policy.attempts()
                        );
                    }
                    self.fetch_page(url)
                },
                |attempt, e, delay| {
                    warn!("attempt {} for {} failed: {}", attempt, url, e);
                    if !delay.is_zero() && self.verbosity.shows_progress() {
                        println!("Retrying in {}s...", delay.as_secs());
                    }
                },
            )
            .map_err(|last| ScraperError::RetriesExhausted {
                attempts: policy.attempts(),
                last: Box::new(last),
            })
    }

    /// One attempt: create (truncate) `dest`, GET `url`, stream the decoded body into the file.
    ///
    /// The file is created before the request, so a failed download leaves an empty or partial file.
    pub fn download_image(&self, url: &str, dest: &Path) -> Result<u64, ScraperError> {
        let parsed = Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            input: url.to_string(),
            reason: e.to_string(),
        })?;
        let mut file = File::create(dest).map_err(|e| ScraperError::io("Cannot create", dest, e))?;

        debug!("downloading {} -> {}", parsed, dest.display());
        let response = self
            .images
            .get(parsed.clone())
            .send()
            .map_err(|e| ScraperError::Network {
                url: url.to_string(),
                source: e,
            })?;
        log_response(&response, self.verbosity);
        let mut response = check_status(response, url)?;
        response.copy_to(&mut file).map_err(|e| ScraperError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    /// [download_image](Self::download_image) wrapped in the image retry policy. No content check.
    pub fn download_image_with_retry(&self, url: &str, dest: &Path) -> Result<u64, ScraperError> {
        let policy = self.image_retry;
        policy
            .run(
                |_| self.download_image(url, dest),
                |attempt, e, delay| {
                    if delay.is_zero() {
                        debug!("image attempt {}/{} failed: {}", attempt, policy.attempts(), e);
                    } else {
                        warn!(
                            "image download failed ({}/{}), retrying in {}s: {}",
                            attempt,
                            policy.attempts(),
                            delay.as_secs(),
                            e
                        );
                    }
                },
            )
            .map_err(|last| ScraperError::RetriesExhausted {
                attempts: policy.attempts(),
                last: Box::new(last),
            })
    }
}

/// Concatenated text of every `<title>` element.
pub fn page_title(doc: &Html) -> String {
    match scraper::Selector::parse("title") {
        Ok(sel) => doc
            .select(&sel)
            .flat_map(|e| e.text())
            .collect::<String>(),
        Err(_) => String::new(),
    }
}

/// A page is usable when its title has content and is not the site's error page.
pub fn is_valid_title(title: &str) -> bool {
    !title.trim().is_empty() && !title.contains(ERROR_TITLE_MARKER)
}

fn check_status(response: Response, url: &str) -> Result<Response, ScraperError> {
    let status = response.status();
    if status == reqwest::StatusCode::OK {
        return Ok(response);
    }
    let mut body = Vec::new();
    // Best effort; the status is the error that matters.
    let _ = response.take(ERROR_BODY_LIMIT).read_to_end(&mut body);
    Err(ScraperError::HttpStatus {
        status: status.as_u16(),
        url: url.to_string(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn log_response(response: &Response, verbosity: Verbosity) {
    debug!("status {} from {}", response.status().as_u16(), response.url());
    if verbosity.is_debug() {
        for (name, value) in response.headers() {
            debug!("  {}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
    }
}

fn header_map(
    pairs: &[(&'static str, &'static str)],
    referer: &str,
) -> Result<HeaderMap, ScraperError> {
    let mut headers = HeaderMap::new();
    for &(name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    let referer = HeaderValue::from_str(referer).map_err(|e| ScraperError::InvalidUrl {
        input: referer.to_string(),
        reason: e.to_string(),
    })?;
    headers.insert(reqwest::header::REFERER, referer);
    Ok(headers)
}

/// Builder for [ComicClient].
#[derive(Debug)]
pub struct ComicClientBuilder {
    base_url: String,
    user_agent: Option<String>,
    timeout_secs: u64,
    page_attempts: u32,
    page_retry_delay: Duration,
    image_attempts: u32,
    image_retry_delay: Duration,
    use_system_proxy: bool,
    verbosity: Verbosity,
}

impl Default for ComicClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_attempts: DEFAULT_PAGE_ATTEMPTS,
            page_retry_delay: Duration::from_secs(DEFAULT_PAGE_RETRY_DELAY_SECS),
            image_attempts: DEFAULT_IMAGE_ATTEMPTS,
            image_retry_delay: Duration::from_secs(DEFAULT_IMAGE_RETRY_DELAY_SECS),
            use_system_proxy: true,
            verbosity: Verbosity::Normal,
        }
    }
}

impl ComicClientBuilder {
    /// Site origin used for `/chapter/<id>`, `/book/<id>`, root-relative images, and the Referer.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Overall request timeout in seconds. Default 60.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Attempts and constant delay for page fetches. Default 3 attempts, 5s apart.
    pub fn page_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.page_attempts = attempts;
        self.page_retry_delay = delay;
        self
    }

    /// Attempts and constant delay for image downloads. Default 3 attempts, 2s apart.
    pub fn image_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.image_attempts = attempts;
        self.image_retry_delay = delay;
        self
    }

    pub fn page_attempts(mut self, attempts: u32) -> Self {
        self.page_attempts = attempts;
        self
    }

    pub fn page_retry_delay(mut self, delay: Duration) -> Self {
        self.page_retry_delay = delay;
        self
    }

    pub fn image_attempts(mut self, attempts: u32) -> Self {
        self.image_attempts = attempts;
        self
    }

    pub fn image_retry_delay(mut self, delay: Duration) -> Self {
        self.image_retry_delay = delay;
        self
    }

    /// Honor HTTP(S)_PROXY and friends (default true).
    pub fn use_system_proxy(mut self, yes: bool) -> Self {
        self.use_system_proxy = yes;
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn build(self) -> Result<ComicClient, ScraperError> {
        Url::parse(&self.base_url).map_err(|e| ScraperError::InvalidUrl {
            input: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let referer = format!("{}/", self.base_url);
        let timeout = Duration::from_secs(self.timeout_secs);

        let mut pages = Client::builder()
            .cookie_store(true)
            .user_agent(user_agent.clone())
            .default_headers(header_map(PAGE_HEADERS, &referer)?)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true);
        let mut images = Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .default_headers(header_map(IMAGE_HEADERS, &referer)?)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(false);
        if !self.use_system_proxy {
            pages = pages.no_proxy();
            images = images.no_proxy();
        }

        Ok(ComicClient {
            pages: pages.build().map_err(ScraperError::ClientBuild)?,
            images: images.build().map_err(ScraperError::ClientBuild)?,
            base_url: self.base_url,
            page_retry: RetryPolicy::constant(self.page_attempts, self.page_retry_delay),
            image_retry: RetryPolicy::constant(self.image_attempts, self.image_retry_delay),
            verbosity: self.verbosity,
        })
    }
}
