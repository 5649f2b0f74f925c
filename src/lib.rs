//! comicbox: web comic downloader with CBZ packing and a single-archive ebook builder.

pub mod archive;
pub mod cli;
pub mod config;
pub mod download;
pub mod model;
pub mod scraper;

#[cfg(test)]
mod testutil;

// Re-exports for the binaries and library consumers.
pub use archive::{pack_chapter, write_ebook, ArchiveError};
pub use config::Verbosity;
pub use download::{
    download_chapter, download_local_chapter, download_local_series, download_series,
    DownloadOptions,
};
pub use model::{Chapter, ChapterInfo, ComicInfo};
pub use scraper::{ComicClient, ComicClientBuilder, RetryPolicy, ScraperError};
