//! Packer: one chapter directory of images becomes `<output dir>/<dir name>.cbz`.

use super::{add_file, base_name, create_archive, list_images, ArchiveError};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of packing one chapter directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub images: usize,
}

/// Write every image in `chapter_dir`, in name order, to `<output_dir>/<base name>.cbz`.
/// `output_dir` is created if missing. An existing archive is overwritten.
pub fn pack_chapter(chapter_dir: &Path, output_dir: &Path) -> Result<PackReport, ArchiveError> {
    if !chapter_dir.is_dir() {
        return Err(ArchiveError::NotADirectory(chapter_dir.to_path_buf()));
    }
    let name = base_name(chapter_dir)
        .ok_or_else(|| ArchiveError::NotADirectory(chapter_dir.to_path_buf()))?;
    std::fs::create_dir_all(output_dir).map_err(|e| ArchiveError::CreateDir {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let images = list_images(chapter_dir)?;
    let output = output_dir.join(format!("{}.cbz", name));
    debug!("packing {} image(s) into {}", images.len(), output.display());

    let mut zip = create_archive(&output)?;
    for image in &images {
        add_file(&mut zip, &chapter_dir.join(image), image)?;
    }
    zip.finish()?;

    Ok(PackReport {
        source: chapter_dir.to_path_buf(),
        output,
        images: images.len(),
    })
}

/// True when `arg` should be expanded as a glob pattern.
pub fn is_pattern(arg: &str) -> bool {
    arg.contains('*') || arg.contains('?')
}

/// Expand command-line arguments into chapter directories to pack.
///
/// Patterns contribute only matching directories; unreadable matches are logged and skipped.
/// Plain arguments are passed through unchanged and checked when packed.
pub fn resolve_inputs(args: &[String]) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut dirs = Vec::new();
    for arg in args {
        if !is_pattern(arg) {
            dirs.push(PathBuf::from(arg));
            continue;
        }
        let paths = glob(arg).map_err(|e| ArchiveError::Pattern {
            pattern: arg.clone(),
            source: e,
        })?;
        let before = dirs.len();
        for entry in paths {
            match entry {
                Ok(path) if path.is_dir() => dirs.push(path),
                Ok(path) => debug!("skipping non-directory match {}", path.display()),
                Err(e) => warn!("skipping {}: {}", e.path().display(), e.error()),
            }
        }
        if dirs.len() == before {
            warn!("pattern {:?} matched no directories", arg);
        }
    }
    Ok(dirs)
}
