//! Tracing setup for the `vocab` binary and the test suites.
//!
//! Human-readable events go to stderr; `--log-file` adds a JSON copy of every
//! event, appended so repeated invocations build one history.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// What the command line asked for.
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    /// Number of `-v` flags.
    pub verbosity: u8,
    pub quiet: bool,
    pub log_file: Option<PathBuf>,
}

impl LogSettings {
    /// Filter used when `RUST_LOG` is not set.
    #[must_use]
    pub fn default_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "vocab_store=warn",
            1 => "vocab_store=info",
            2 => "vocab_store=debug",
            _ => "vocab_store=trace,rusqlite=debug",
        }
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.default_filter()))
            .context("invalid log filter")
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the verbosity flags.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a subscriber is
/// already installed.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(settings.verbosity > 1)
        .with_file(cfg!(debug_assertions) && settings.verbosity > 2)
        .with_line_number(cfg!(debug_assertions) && settings.verbosity > 2)
        .with_ansi(std::io::stderr().is_terminal())
        .compact();

    let file_layer = settings
        .log_file
        .as_deref()
        .map(open_log_file)
        .transpose()?
        .map(|file| {
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .json()
                .with_current_span(true)
        });

    tracing_subscriber::registry()
        .with(settings.env_filter()?)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("a tracing subscriber is already installed")
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

/// Route library events to the test harness output. Safe to call repeatedly.
pub fn init_test_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("vocab_store=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
