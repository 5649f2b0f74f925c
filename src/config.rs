//! Optional config file loading and runtime verbosity. Search order: ./comicbox.toml, then
//! $XDG_CONFIG_HOME/comicbox/config.toml (or ~/.config/comicbox/config.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// How much the tools print. Passed explicitly to the client and download calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors and warnings only.
    Quiet,
    /// Progress and summaries on stdout.
    #[default]
    Normal,
    /// Progress plus request/response diagnostics.
    Debug,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    pub fn is_debug(self) -> bool {
        self == Verbosity::Debug
    }

    pub fn shows_progress(self) -> bool {
        self != Verbosity::Quiet
    }

    /// Default `tracing` filter directive when RUST_LOG is not set.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Debug => "comicbox=debug,warn",
            Verbosity::Normal | Verbosity::Quiet => "warn",
        }
    }
}

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Root directory for downloaded chapters when -o is not set. Relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// Site origin, e.g. "https://www.92hm.life".
    pub base_url: Option<String>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Overall request timeout in seconds (default 60).
    pub timeout_secs: Option<u64>,
    /// Page fetch attempts (default 3).
    pub page_attempts: Option<u32>,
    /// Seconds between page fetch attempts (default 5).
    pub page_retry_delay_secs: Option<u64>,
    /// Image download attempts (default 3).
    pub image_attempts: Option<u32>,
    /// Seconds between image download attempts (default 2).
    pub image_retry_delay_secs: Option<u64>,
    /// Honor proxy environment variables (default true).
    pub use_system_proxy: Option<bool>,
}

const CONFIG_FILE_NAME: &str = "comicbox.toml";
const CONFIG_DIR_NAME: &str = "comicbox";
const USER_CONFIG_FILE_NAME: &str = "config.toml";

/// Candidate config files, most specific first.
fn config_paths(cwd: &Path, user_config_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![cwd.join(CONFIG_FILE_NAME)];
    if let Some(d) = user_config_dir {
        paths.push(d.join(CONFIG_DIR_NAME).join(USER_CONFIG_FILE_NAME));
    }
    paths
}

/// First existing file wins; later candidates are not read.
fn load_first(paths: &[PathBuf]) -> Result<Option<Config>, String> {
    let Some(path) = paths.iter().find(|p| p.exists()) else {
        return Ok(None);
    };
    let s = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
    toml::from_str(&s)
        .map(Some)
        .map_err(|e| format!("Invalid config {}: {}", path.display(), e))
}

/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    load_first(&config_paths(&cwd, dirs::config_dir().as_deref()))
}
