//! `macism` command runner
//!
//! `macism` with no arguments prints the active input method id;
//! `macism <id>` switches to it and exits non-zero on failure.

use std::process::Command;

use tracing::debug;

use super::{InputMethodError, InputMethodPort};

/// Name of the external input method tool
pub const MACISM: &str = "macism";

/// Input method port backed by the `macism` binary
#[derive(Debug, Clone)]
pub struct Macism {
    program: String,
}

impl Macism {
    pub fn new() -> Self {
        Self::with_program(MACISM)
    }

    /// Use a specific executable instead of looking up `macism` on PATH
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check whether the tool can be found on PATH
    pub fn is_installed(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn run(&self, args: &[&str], action: &str) -> Result<String, InputMethodError> {
        debug!(program = %self.program, ?args, "running input method tool");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => InputMethodError::NotInstalled(self.program.clone()),
                _ => InputMethodError::Io {
                    tool: self.program.clone(),
                    source: e,
                },
            })?;

        if !output.status.success() {
            return Err(InputMethodError::CommandFailed {
                tool: self.program.clone(),
                action: action.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Macism {
    fn default() -> Self {
        Self::new()
    }
}

impl InputMethodPort for Macism {
    fn current(&self) -> Result<String, InputMethodError> {
        Ok(self.run(&[], "query")?.trim().to_string())
    }

    fn list(&self) -> Result<Vec<String>, InputMethodError> {
        let output = self.run(&[], "list")?;
        let methods: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if methods.is_empty() {
            return Err(InputMethodError::Empty);
        }
        Ok(methods)
    }

    fn switch_to(&self, id: &str) -> Result<(), InputMethodError> {
        self.run(&[id], &format!("switch to {id}"))?;
        Ok(())
    }
}
