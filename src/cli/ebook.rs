//! `ebook`: pack a whole comic directory into one CBZ with metadata and a table of contents.

use super::{init_tracing, CliRunError};
use crate::archive::write_ebook;
use crate::config::Verbosity;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ebook")]
#[command(about = "Build one CBZ ebook (comic.json, toc.html, all chapters) from a comic directory")]
#[command(arg_required_else_help = true)]
pub struct EbookArgs {
    /// Comic directory containing one subdirectory per chapter, e.g. `001_Chapter 1`.
    pub comic_dir: PathBuf,

    /// Output file. Default: `<comic dir>.cbz` next to the directory.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Log chapter details and print error causes.
    #[arg(long)]
    pub debug: bool,

    /// Suppress progress output (warnings and errors only).
    #[arg(short, long)]
    pub quiet: bool,
}

/// Entry point for `ebook`.
pub fn run(args: &EbookArgs) -> Result<(), CliRunError> {
    let verbosity = Verbosity::from_flags(args.quiet, args.debug);
    init_tracing(verbosity);

    if !args.comic_dir.is_dir() {
        return Err(CliRunError::InvalidInput(format!(
            "Comic directory '{}' does not exist",
            args.comic_dir.display()
        )));
    }
    let report = write_ebook(&args.comic_dir, args.output.as_deref())?;
    if verbosity.shows_progress() {
        println!(
            "Created ebook {} ({} chapters, {} pages)",
            report.output.display(),
            report.chapters,
            report.pages
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn parses_dir_and_output() {
        let args = EbookArgs::try_parse_from(["ebook", "My Comic", "--output", "b.cbz"]).unwrap();
        assert_eq!(args.comic_dir, PathBuf::from("My Comic"));
        assert_eq!(args.output, Some(PathBuf::from("b.cbz")));
    }

    #[test]
    fn missing_comic_dir_is_input_error() {
        let args = EbookArgs {
            comic_dir: PathBuf::from("/nonexistent_comicbox_comic"),
            output: None,
            debug: false,
            quiet: true,
        };
        assert_eq!(run(&args).unwrap_err().exit_code(), 1);
    }

    #[test]
    fn builds_ebook_next_to_directory() -> Result<(), Box<dyn Error>> {
        let work = tempfile::tempdir()?;
        let chapter = work.path().join("Comic").join("001_One");
        std::fs::create_dir_all(&chapter)?;
        std::fs::write(chapter.join("0001.jpg"), b"x")?;
        let args = EbookArgs {
            comic_dir: work.path().join("Comic"),
            output: None,
            debug: false,
            quiet: true,
        };
        run(&args)?;
        assert!(work.path().join("Comic.cbz").exists());
        Ok(())
    }
}
