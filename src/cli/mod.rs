//! Command-line front ends for the three binaries: `comicbox` (fetch), `pack`, and `ebook`.
//! Shared here: the error type that maps to exit codes, logging setup, and the image progress bar.

pub mod ebook;
pub mod fetch;
pub mod pack;

use crate::archive::ArchiveError;
use crate::config::Verbosity;
use crate::scraper::ScraperError;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Scraper(#[from] ScraperError),

    #[error("{0}")]
    Archive(#[from] ArchiveError),

    #[error("{failed} of {total} item(s) failed")]
    Incomplete { failed: usize, total: usize },
}

impl CliRunError {
    /// 1 invalid input or config, 2 scrape or network failure, 3 archive or filesystem failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Scraper(ScraperError::InvalidUrl { .. }) => 1,
            CliRunError::Scraper(ScraperError::Io { .. }) => 3,
            CliRunError::Scraper(_) => 2,
            CliRunError::Archive(_) | CliRunError::Incomplete { .. } => 3,
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over the verbosity default.
pub fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Progress bar for image downloads, recreated for every chapter.
#[derive(Default)]
pub(crate) struct ImageProgress {
    bar: RefCell<Option<ProgressBar>>,
}

impl ImageProgress {
    /// Feed (images done, images total). A bar is created lazily and cleared when done reaches total.
    pub(crate) fn update(&self, done: u32, total: u32) {
        if total == 0 {
            return;
        }
        let mut state = self.bar.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
            {
                bar.set_style(
                    style
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                        .progress_chars("█▉▊▋▌▍▎▏ "),
                );
            }
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_position(done as u64);
        pb.set_message(format!("Downloading image {}/{}", done, total));
        if done >= total {
            pb.disable_steady_tick();
            pb.finish_and_clear();
            *state = None;
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.disable_steady_tick();
            pb.finish_and_clear();
        }
    }
}

/// Print `e` and, with `--debug`, its source chain to stderr.
pub fn report_error(e: &CliRunError, debug: bool) {
    use std::error::Error;
    eprintln!("{}", e);
    if debug {
        let mut source = e.source();
        while let Some(s) = source {
            eprintln!("  cause: {}", s);
            source = s.source();
        }
    }
}
