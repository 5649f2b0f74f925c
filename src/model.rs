//! Data model shared by the downloader and the ebook builder.

use serde::{Deserialize, Serialize};

/// One chapter link found on a comic's table-of-contents page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterInfo {
    pub id: String,
    pub title: String,
}

/// Metadata written as `comic.json` inside an ebook archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicInfo {
    pub title: String,
    pub chapters: Vec<Chapter>,
}

/// One chapter directory inside a comic directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    /// Directory name under the comic directory, e.g. `001_Chapter 1`.
    pub dir_name: String,
    pub image_count: usize,
    /// 1-based page number of this chapter's first image across the whole comic.
    pub start_page: usize,
    /// First image file name in reading order, used for TOC links. Not part of `comic.json`.
    #[serde(skip)]
    pub first_image: Option<String>,
}

impl Chapter {
    /// Last page number of this chapter, or `None` when it has no images.
    pub fn end_page(&self) -> Option<usize> {
        if self.image_count == 0 {
            None
        } else {
            Some(self.start_page + self.image_count - 1)
        }
    }
}
