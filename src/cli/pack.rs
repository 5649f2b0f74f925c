//! `pack`: turn chapter directories into `.cbz` files.

use super::{init_tracing, CliRunError};
use crate::archive::{pack_chapter, resolve_inputs};
use crate::config::Verbosity;
use clap::Parser;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "pack")]
#[command(about = "Pack chapter image directories into CBZ files")]
#[command(arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  pack chapter_16124\n  pack 'chapter_*'\n  pack -o out 'My Comic/*'"
)]
pub struct PackArgs {
    /// Chapter directories or glob patterns (`*`, `?`). Patterns pack matching directories only.
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Directory for the .cbz files; created if missing.
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Log file-level details and print error causes.
    #[arg(long)]
    pub debug: bool,

    /// Suppress progress output (warnings and errors only).
    #[arg(short, long)]
    pub quiet: bool,
}

/// Entry point for `pack`. Failed directories are reported and skipped; any failure makes the
/// run end with an error after the rest are packed.
pub fn run(args: &PackArgs) -> Result<(), CliRunError> {
    let verbosity = Verbosity::from_flags(args.quiet, args.debug);
    init_tracing(verbosity);

    let dirs = resolve_inputs(&args.inputs)?;
    if dirs.is_empty() {
        return Err(CliRunError::InvalidInput(format!(
            "No chapter directories match {}",
            args.inputs.join(" ")
        )));
    }

    let mut failed = 0;
    for dir in &dirs {
        match pack_chapter(dir, &args.output) {
            Ok(report) => {
                if verbosity.shows_progress() {
                    println!(
                        "Packed {} -> {} ({} images)",
                        report.source.display(),
                        report.output.display(),
                        report.images
                    );
                }
            }
            Err(e) => {
                failed += 1;
                error!("failed to pack {}: {}", dir.display(), e);
            }
        }
    }

    if failed > 0 {
        return Err(CliRunError::Incomplete {
            failed,
            total: dirs.len(),
        });
    }
    Ok(())
}
