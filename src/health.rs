//! Environment health check (`health` / `doctor`)

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Paths;
use crate::input_method::Macism;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("{0} not found on PATH")]
    ToolMissing(String),

    #[error("{kind} file permission error ({path}): {source}")]
    Permission {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Verify the switch tool is installed and our files are usable
pub fn check(paths: &Paths, tool: &Macism) -> Result<(), HealthError> {
    if !tool.is_installed() {
        return Err(HealthError::ToolMissing(crate::input_method::MACISM.to_string()));
    }

    check_read_write("config", &paths.config_file)?;
    check_read_write("log", &paths.log_file)?;
    Ok(())
}

/// An existing file must be readable and writable; a missing one is fine
fn check_read_write(kind: &'static str, path: &Path) -> Result<(), HealthError> {
    if !path.exists() {
        debug!(?path, "{kind} file not present, skipping");
        return Ok(());
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| HealthError::Permission {
            kind,
            path: path.to_owned(),
            source,
        })
}
