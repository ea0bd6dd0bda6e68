//! Diagnostics setup. Quiet unless `--verbose` or `RUST_LOG` is given.
//!
//! The watch screen is redrawn in place, so while it runs log lines go to a
//! file instead of the terminal.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, PartialEq)]
pub enum LogOutput {
    Stderr,
    File(PathBuf),
}

fn app_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    }
}

/// Opens `path` for appending, creating missing parent directories.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

/// Installs the global subscriber. A log file that cannot be opened falls
/// back to stderr.
pub fn init_logging(verbose: bool, output: LogOutput) {
    let level = app_level(verbose);
    let app_filter = Targets::new().with_target("xrate", level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let (file, file_error) = match &output {
        LogOutput::Stderr => (None, None),
        LogOutput::File(path) => match open_log_file(path) {
            Ok(file) => (Some(file), None),
            Err(e) => (None, Some(e)),
        },
    };

    let stderr_layer = file.is_none().then(|| {
        fmt::layer()
            .pretty()
            .without_time()
            .with_writer(std::io::stderr)
    });
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(app_filter)
        .with(env_filter)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(error = ?e, "Logging to stderr instead");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_app_level() {
        assert_eq!(app_level(true), LevelFilter::DEBUG);
        assert_eq!(app_level(false), LevelFilter::OFF);
    }

    #[test]
    fn test_open_log_file_creates_directories_and_appends() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("xrate.log");

        writeln!(open_log_file(&path)?, "first")?;
        writeln!(open_log_file(&path)?, "second")?;

        assert_eq!(fs::read_to_string(&path)?, "first\nsecond\n");
        Ok(())
    }

    #[test]
    fn test_open_log_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a log file
        let err = open_log_file(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to open log file:"));
    }
}
