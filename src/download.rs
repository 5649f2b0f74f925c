//! Fetcher flows: single chapter (remote or local file) and whole series (remote or local TOC).
//! Images are saved sequentially as `0001.jpg`, `0002.jpg`, ... Per-image and per-chapter failures
//! are logged and skipped; only top-level failures are returned as errors.

use crate::model::ChapterInfo;
use crate::scraper::{
    extract_chapter_links, extract_chapter_title, extract_comic_title, extract_image_urls,
    parse_local_file, sanitize_file_name, ComicClient, ScraperError,
};
use reqwest::Url;
use scraper::Html;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Options for a download run.
#[derive(Default)]
pub struct DownloadOptions<'a> {
    /// Called with (images done, images total) for each chapter: once with 0 before the first
    /// image and once after every image, including failed ones.
    pub progress: Option<&'a dyn Fn(u32, u32)>,
}

/// A chapter to fetch: its id (used for the default directory name) and page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterTarget {
    pub id: String,
    pub url: String,
}

/// Outcome of one chapter download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterReport {
    pub title: String,
    pub dir: PathBuf,
    pub images_found: usize,
    pub images_saved: usize,
}

/// Outcome of a series download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesReport {
    pub title: String,
    pub dir: PathBuf,
    pub chapters_total: usize,
    pub chapters_attempted: usize,
    pub chapters_completed: usize,
}

/// Turn a chapter id or a full URL into a fetch target.
///
/// A URL is used as-is and its last path segment becomes the id; anything else is an id
/// appended to `<origin>/chapter/`.
pub fn resolve_chapter_target(
    client: &ComicClient,
    input: &str,
) -> Result<ChapterTarget, ScraperError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ScraperError::InvalidUrl {
            input: input.to_string(),
            reason: "expected a chapter id or URL".to_string(),
        });
    }
    if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input).map_err(|e| ScraperError::InvalidUrl {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        let id = url
            .path_segments()
            .and_then(|segs| segs.filter(|s| !s.is_empty()).last())
            .map(str::to_string)
            .ok_or_else(|| ScraperError::InvalidUrl {
                input: input.to_string(),
                reason: "URL has no chapter id in its path".to_string(),
            })?;
        return Ok(ChapterTarget {
            id,
            url: input.to_string(),
        });
    }
    if input.chars().any(char::is_whitespace) {
        return Err(ScraperError::InvalidUrl {
            input: input.to_string(),
            reason: "chapter id must not contain whitespace".to_string(),
        });
    }
    Ok(ChapterTarget {
        id: input.to_string(),
        url: client.chapter_url(input),
    })
}

/// Download one chapter by id or URL into `<root>/<chapter title>/`.
pub fn download_chapter(
    client: &ComicClient,
    input: &str,
    root: &Path,
    opts: &DownloadOptions,
) -> Result<ChapterReport, ScraperError> {
    let target = resolve_chapter_target(client, input)?;
    if client.verbosity().shows_progress() {
        println!("Downloading chapter {}...", target.id);
    }
    let doc = client.fetch_page_with_retry(&target.url)?;
    save_chapter(
        client,
        &doc,
        &target.url,
        &format!("chapter_{}", target.id),
        root,
        opts,
    )
}

/// Download the images referenced by a saved chapter page into `<root>/<chapter title>/`.
pub fn download_local_chapter(
    client: &ComicClient,
    path: &Path,
    root: &Path,
    opts: &DownloadOptions,
) -> Result<ChapterReport, ScraperError> {
    if client.verbosity().shows_progress() {
        println!("Parsing image links from {}...", path.display());
    }
    let doc = parse_local_file(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    save_chapter(
        client,
        &doc,
        &path.display().to_string(),
        &format!("chapter_local_{}", file_name),
        root,
        opts,
    )
}

fn save_chapter(
    client: &ComicClient,
    doc: &Html,
    source: &str,
    default_title: &str,
    root: &Path,
    opts: &DownloadOptions,
) -> Result<ChapterReport, ScraperError> {
    let urls = extract_image_urls(doc, client.base_url())?;
    if urls.is_empty() {
        return Err(ScraperError::NoImages(source.to_string()));
    }
    if client.verbosity().shows_progress() {
        println!("Found {} images", urls.len());
    }

    let title = match extract_chapter_title(doc)? {
        t if t.is_empty() => sanitize_file_name(default_title),
        t => t,
    };
    let dir = root.join(&title);
    std::fs::create_dir_all(&dir).map_err(|e| ScraperError::io("Cannot create", &dir, e))?;

    let saved = save_images(client, &urls, &dir, opts);
    if client.verbosity().shows_progress() {
        println!(
            "Chapter \"{}\" done: {}/{} images saved in {}",
            title,
            saved,
            urls.len(),
            dir.display()
        );
    }
    Ok(ChapterReport {
        title,
        dir,
        images_found: urls.len(),
        images_saved: saved,
    })
}

/// Download `urls` in order as `0001.jpg`, `0002.jpg`, ... under `dir`. Returns how many succeeded.
fn save_images(client: &ComicClient, urls: &[String], dir: &Path, opts: &DownloadOptions) -> usize {
    let total = urls.len() as u32;
    if let Some(cb) = opts.progress {
        cb(0, total);
    }
    let mut saved = 0;
    for (i, url) in urls.iter().enumerate() {
        let dest = dir.join(format!("{:04}.jpg", i + 1));
        match client.download_image_with_retry(url, &dest) {
            Ok(bytes) => {
                saved += 1;
                debug!("saved {} ({} bytes)", dest.display(), bytes);
            }
            Err(e) => warn!("image {} of {} failed: {}", i + 1, total, e),
        }
        if let Some(cb) = opts.progress {
            cb(i as u32 + 1, total);
        }
    }
    saved
}

/// Download every chapter of series `series_id` into `<root>/<comic title>/NNN_<chapter title>/`.
///
/// With `start`, chapters before the one with that id are skipped; an unknown id logs a warning
/// and starts from the first chapter.
pub fn download_series(
    client: &ComicClient,
    series_id: &str,
    start: Option<&str>,
    root: &Path,
    opts: &DownloadOptions,
) -> Result<SeriesReport, ScraperError> {
    if client.verbosity().shows_progress() {
        println!("Downloading series {}...", series_id);
    }
    let url = client.book_url(series_id);
    let doc = client.fetch_page_with_retry(&url)?;
    save_series(
        client,
        &doc,
        &url,
        &format!("comic_{}", series_id),
        start,
        root,
        opts,
    )
}

/// Like [download_series], but the chapter list comes from a saved TOC page. Chapter pages
/// are still fetched from the site.
pub fn download_local_series(
    client: &ComicClient,
    path: &Path,
    start: Option<&str>,
    root: &Path,
    opts: &DownloadOptions,
) -> Result<SeriesReport, ScraperError> {
    if client.verbosity().shows_progress() {
        println!("Reading chapter list from {}...", path.display());
    }
    let doc = parse_local_file(path)?;
    save_series(
        client,
        &doc,
        &path.display().to_string(),
        "local_comic",
        start,
        root,
        opts,
    )
}

fn save_series(
    client: &ComicClient,
    toc: &Html,
    source: &str,
    default_title: &str,
    start: Option<&str>,
    root: &Path,
    opts: &DownloadOptions,
) -> Result<SeriesReport, ScraperError> {
    let verbosity = client.verbosity();
    let chapters = extract_chapter_links(toc)?;
    if chapters.is_empty() {
        return Err(ScraperError::NoChapters(source.to_string()));
    }
    let title = match extract_comic_title(toc)? {
        t if t.is_empty() => sanitize_file_name(default_title),
        t => t,
    };
    let dir = root.join(&title);
    std::fs::create_dir_all(&dir).map_err(|e| ScraperError::io("Cannot create", &dir, e))?;
    if verbosity.shows_progress() {
        println!("Comic: {}", title);
        println!("Found {} chapters", chapters.len());
    }

    let total = chapters.len();
    let first = start_index(&chapters, start);
    if first > 0 && verbosity.shows_progress() {
        println!("Starting at chapter [{}/{}]", first + 1, total);
    }

    let mut attempted = 0;
    let mut completed = 0;
    for (i, chapter) in chapters.iter().enumerate().skip(first) {
        attempted += 1;
        if verbosity.shows_progress() {
            println!(
                "\nChapter [{}/{}]: {} ({})",
                i + 1,
                total,
                chapter.title,
                chapter.id
            );
        }
        let chapter_dir = dir.join(format!("{:03}_{}", i + 1, sanitize_file_name(&chapter.title)));
        match save_series_chapter(client, chapter, &chapter_dir, opts) {
            Ok((found, saved)) => {
                completed += 1;
                if verbosity.shows_progress() {
                    println!("Saved {}/{} images", saved, found);
                }
            }
            Err(e) => warn!("chapter {} ({}) skipped: {}", chapter.title, chapter.id, e),
        }
    }

    if verbosity.shows_progress() {
        println!(
            "\nComic \"{}\" done: {}/{} chapters in {}",
            title,
            completed,
            attempted,
            dir.display()
        );
    }
    Ok(SeriesReport {
        title,
        dir,
        chapters_total: total,
        chapters_attempted: attempted,
        chapters_completed: completed,
    })
}

/// Position of chapter `start` in `chapters`, or 0 (with a warning) when it is not listed.
fn start_index(chapters: &[ChapterInfo], start: Option<&str>) -> usize {
    let Some(start) = start else {
        return 0;
    };
    match chapters.iter().position(|c| c.id == start) {
        Some(i) => i,
        None => {
            warn!(
                "start chapter {} not found, downloading from the first chapter",
                start
            );
            0
        }
    }
}

fn save_series_chapter(
    client: &ComicClient,
    chapter: &ChapterInfo,
    dir: &Path,
    opts: &DownloadOptions,
) -> Result<(usize, usize), ScraperError> {
    let url = client.chapter_url(&chapter.id);
    let doc = client.fetch_page_with_retry(&url)?;
    let urls = extract_image_urls(&doc, client.base_url())?;
    if urls.is_empty() {
        return Err(ScraperError::NoImages(url));
    }
    std::fs::create_dir_all(dir).map_err(|e| ScraperError::io("Cannot create", dir, e))?;
    let saved = save_images(client, &urls, dir, opts);
    Ok((urls.len(), saved))
}
