//! `comicbox`: download a chapter or a whole series.

use super::{init_tracing, CliRunError, ImageProgress};
use crate::config::{self, Config, Verbosity};
use crate::download::{
    download_chapter, download_local_chapter, download_local_series, download_series,
    ChapterReport, DownloadOptions, SeriesReport,
};
use crate::scraper::ComicClient;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "comicbox")]
#[command(about = "Download web comic chapters or whole series as numbered images")]
#[command(arg_required_else_help = true)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["input", "local", "series", "local_series"])
))]
#[command(
    after_help = "Chapter and comic ids are the numbers in the site URLs, e.g. /chapter/16124 and /book/418.\nPack chapters with `pack <dir>...` and whole comics with `ebook <dir>`.\nConfig file keys (output_dir, base_url, user_agent, timeout_secs, page_attempts, page_retry_delay_secs, image_attempts, image_retry_delay_secs, use_system_proxy) are read from ./comicbox.toml or the user config dir. CLI flags override config."
)]
pub struct FetchArgs {
    /// Chapter id (e.g. 16124) or full chapter URL.
    pub input: Option<String>,

    /// Parse image links from a saved chapter page instead of fetching it.
    #[arg(long, value_name = "FILE")]
    pub local: Option<PathBuf>,

    /// Download every chapter of the comic with this id.
    #[arg(long, value_name = "ID")]
    pub series: Option<String>,

    /// Read the chapter list from a saved comic page, then fetch each chapter.
    #[arg(long, value_name = "FILE")]
    pub local_series: Option<PathBuf>,

    /// With --series or --local-series: begin at this chapter id.
    #[arg(long, value_name = "CHAPTER_ID")]
    pub start: Option<String>,

    /// Directory that receives chapter or comic directories. Default: config output_dir or `.`.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Log requests, headers, and responses; print error causes.
    #[arg(long)]
    pub debug: bool,

    /// Suppress progress output (warnings and errors only).
    #[arg(short, long)]
    pub quiet: bool,
}

/// Client settings from config, falling back to built-in defaults for missing keys.
pub(crate) fn build_client(
    config: Option<&Config>,
    verbosity: Verbosity,
) -> Result<ComicClient, CliRunError> {
    let mut builder = ComicClient::builder().verbosity(verbosity);
    if let Some(c) = config {
        if let Some(url) = &c.base_url {
            builder = builder.base_url(url.clone());
        }
        if let Some(ua) = &c.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        if let Some(secs) = c.timeout_secs {
            builder = builder.timeout_secs(secs);
        }
        if let Some(n) = c.page_attempts {
            builder = builder.page_attempts(n);
        }
        if let Some(secs) = c.page_retry_delay_secs {
            builder = builder.page_retry_delay(Duration::from_secs(secs));
        }
        if let Some(n) = c.image_attempts {
            builder = builder.image_attempts(n);
        }
        if let Some(secs) = c.image_retry_delay_secs {
            builder = builder.image_retry_delay(Duration::from_secs(secs));
        }
        if let Some(proxy) = c.use_system_proxy {
            builder = builder.use_system_proxy(proxy);
        }
    }
    builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))
}

fn print_chapter(report: &ChapterReport) {
    println!(
        "\nChapter \"{}\" finished: {}/{} images in {}",
        report.title,
        report.images_saved,
        report.images_found,
        report.dir.display()
    );
}

fn print_series(report: &SeriesReport) {
    println!(
        "\nComic \"{}\" finished: {}/{} chapters downloaded ({} listed) in {}",
        report.title,
        report.chapters_completed,
        report.chapters_attempted,
        report.chapters_total,
        report.dir.display()
    );
}

/// Entry point for `comicbox`.
pub fn run(args: &FetchArgs) -> Result<(), CliRunError> {
    let verbosity = Verbosity::from_flags(args.quiet, args.debug);
    init_tracing(verbosity);

    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let client = build_client(config.as_ref(), verbosity)?;
    let root: PathBuf = args
        .output_dir
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.output_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("."));

    let series_mode = args.series.is_some() || args.local_series.is_some();
    if args.start.is_some() && !series_mode {
        warn!("--start only applies to --series and --local-series; ignored");
    }
    let start = args.start.as_deref();

    let progress = ImageProgress::default();
    let progress_cb = |done: u32, total: u32| progress.update(done, total);
    // The bar would interleave with debug logs, so it is only drawn at normal verbosity.
    let progress_ref: Option<&dyn Fn(u32, u32)> = if verbosity == Verbosity::Normal {
        Some(&progress_cb)
    } else {
        None
    };
    let opts = DownloadOptions {
        progress: progress_ref,
    };

    let result = if let Some(path) = &args.local_series {
        download_local_series(&client, path, start, &root, &opts).map(|r| {
            if verbosity.shows_progress() {
                print_series(&r);
            }
        })
    } else if let Some(id) = &args.series {
        download_series(&client, id, start, &root, &opts).map(|r| {
            if verbosity.shows_progress() {
                print_series(&r);
            }
        })
    } else if let Some(path) = &args.local {
        download_local_chapter(&client, path, &root, &opts).map(|r| {
            if verbosity.shows_progress() {
                print_chapter(&r);
            }
        })
    } else if let Some(input) = &args.input {
        download_chapter(&client, input, &root, &opts).map(|r| {
            if verbosity.shows_progress() {
                print_chapter(&r);
            }
        })
    } else {
        return Err(CliRunError::InvalidInput(
            "Expected a chapter id or URL, --local, --series, or --local-series.".to_string(),
        ));
    };
    progress.finish();
    result.map_err(CliRunError::from)
}
