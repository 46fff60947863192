//! Logging setup
//!
//! One-shot commands log to stderr. The daemon appends to a single log
//! file in the home directory. `RUST_LOG` overrides the default level.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Append to `log_file`; keep the returned guard alive to flush on exit
pub fn init_file(log_file: &Path) -> Result<WorkerGuard> {
    let dir = log_file
        .parent()
        .context("log file has no parent directory")?;
    let name = log_file
        .file_name()
        .context("log file has no file name")?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {dir:?}"))?;

    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(writer)
        .init();

    tracing::info!(?log_file, "file logging enabled");
    Ok(guard)
}
