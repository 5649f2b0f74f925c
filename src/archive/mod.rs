//! CBZ writing shared by the packer and the ebook builder: image listing, archive errors, and
//! file entries that carry the source file's timestamp and permissions.

pub mod ebook;
pub mod pack;

pub use ebook::{read_comic_info, render_toc, write_ebook, EbookReport};
pub use pack::{pack_chapter, resolve_inputs, PackReport};

use chrono::{Datelike, Local, Timelike};
use std::fs::{File, Metadata};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// File extensions (lowercase) treated as comic pages.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Errors from the packer and ebook builder. Maps to CLI exit code 3.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create archive file: {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot add {path} to archive: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to write comic metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<std::io::Error> for ArchiveError {
    fn from(e: std::io::Error) -> Self {
        ArchiveError::Zip(zip::result::ZipError::Io(e))
    }
}

/// True when `name` has one of [IMAGE_EXTENSIONS], ignoring case.
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Image file names directly inside `dir`, sorted by name. This order is the reading order.
pub fn list_images(dir: &Path) -> Result<Vec<String>, ArchiveError> {
    let read_err = |e| ArchiveError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if !entry.path().is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!("skipping non-UTF-8 file name in {}", dir.display());
            continue;
        };
        if is_image_name(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Entry options for a page image: stored as-is, with the source's mtime and mode.
pub(crate) fn image_options(meta: &Metadata) -> SimpleFileOptions {
    let mut options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    if let Some(modified) = meta.modified().ok().and_then(zip_time) {
        options = options.last_modified_time(modified);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(meta.permissions().mode());
    }
    options
}

/// Local wall-clock time as a zip timestamp. `None` outside the zip range (1980..=2107).
fn zip_time(t: std::time::SystemTime) -> Option<zip::DateTime> {
    let local: chrono::DateTime<Local> = t.into();
    let year = u16::try_from(local.year()).ok()?;
    zip::DateTime::from_date_and_time(
        year,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}

/// Stream the file at `src` into the archive as `entry_name`.
pub(crate) fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    src: &Path,
    entry_name: &str,
) -> Result<(), ArchiveError> {
    let file_err = |e| ArchiveError::ReadFile {
        path: src.to_path_buf(),
        source: e,
    };
    let mut file = File::open(src).map_err(file_err)?;
    let meta = file.metadata().map_err(file_err)?;
    zip.start_file(entry_name, image_options(&meta))?;
    std::io::copy(&mut file, zip)?;
    Ok(())
}

/// Create `path` and wrap it in a zip writer.
pub(crate) fn create_archive(path: &Path) -> Result<ZipWriter<File>, ArchiveError> {
    let file = File::create(path).map_err(|e| ArchiveError::CreateFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(ZipWriter::new(file))
}

/// Last path component, resolving `.` and `..` through the filesystem when needed.
pub(crate) fn base_name(path: &Path) -> Option<String> {
    match path.file_name() {
        Some(name) => Some(name.to_string_lossy().into_owned()),
        None => path
            .canonicalize()
            .ok()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn image_names_match_case_insensitively() {
        assert!(is_image_name("0001.jpg"));
        assert!(is_image_name("cover.JPEG"));
        assert!(is_image_name("a.Png"));
        assert!(is_image_name("anim.gif"));
        assert!(!is_image_name("page.webp"));
        assert!(!is_image_name("comic.json"));
        assert!(!is_image_name("jpg"));
    }

    #[test]
    fn list_images_filters_and_sorts() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        for name in ["0002.jpg", "0010.jpg", "0001.jpg", "notes.txt", "0003.PNG"] {
            std::fs::write(dir.path().join(name), b"x")?;
        }
        std::fs::create_dir(dir.path().join("sub.jpg"))?;
        assert_eq!(
            list_images(dir.path())?,
            vec!["0001.jpg", "0002.jpg", "0003.PNG", "0010.jpg"]
        );
        Ok(())
    }

    #[test]
    fn list_images_missing_dir_errors() {
        let result = list_images(Path::new("/nonexistent_comicbox_dir"));
        assert!(matches!(result, Err(ArchiveError::ReadDir { .. })));
    }

    #[test]
    fn zip_time_keeps_recent_dates() {
        let t = std::time::SystemTime::now();
        let dt = zip_time(t).unwrap();
        assert!(dt.year() >= 2024);
        assert!(zip_time(std::time::UNIX_EPOCH).is_none());
    }

    #[test]
    fn base_name_of_plain_and_dot_paths() -> Result<(), Box<dyn Error>> {
        assert_eq!(base_name(Path::new("a/b/chapter_1")).as_deref(), Some("chapter_1"));
        assert_eq!(base_name(Path::new("chapter_1/")).as_deref(), Some("chapter_1"));
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("Comic");
        std::fs::create_dir(&nested)?;
        assert_eq!(base_name(&nested.join(".")).as_deref(), Some("Comic"));
        Ok(())
    }
}
