//! Input method port
//!
//! The switch itself is performed by an external command. Everything else
//! talks to it through [`InputMethodPort`] so tests can substitute a fake.

mod macism;

pub use macism::{Macism, MACISM};

/// Query and switch the active input method
pub trait InputMethodPort: Send + Sync {
    /// Identifier of the active input method
    fn current(&self) -> Result<String, InputMethodError>;

    /// Available input method identifiers, in the tool's order
    fn list(&self) -> Result<Vec<String>, InputMethodError>;

    /// Make `id` the active input method
    fn switch_to(&self, id: &str) -> Result<(), InputMethodError>;

    /// Whether `id` is one of the available input methods.
    ///
    /// Membership test against `list()`; never switches.
    fn exists(&self, id: &str) -> Result<bool, InputMethodError> {
        Ok(self.list()?.iter().any(|m| m == id))
    }
}

/// Errors from the external input method tool
#[derive(Debug, thiserror::Error)]
pub enum InputMethodError {
    #[error("{0} not found (install it with: brew tap laishulu/macism && brew install macism)")]
    NotInstalled(String),

    #[error("failed to run {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} {action} failed ({status}): {stderr}")]
    CommandFailed {
        tool: String,
        action: String,
        status: String,
        stderr: String,
    },

    #[error("no input methods found")]
    Empty,
}


#[cfg(test)]
mod tests {
    use super::fake::FakePort;
    use super::*;

    #[test]
    fn test_exists_does_not_switch() {
        let port = FakePort::new(&["a", "b"], "a");
        assert!(port.exists("b").unwrap());
        assert!(!port.exists("c").unwrap());
        assert!(port.switches().is_empty());
        assert_eq!(port.current().unwrap(), "a");
    }

    #[test]
    fn test_exists_propagates_list_failure() {
        let port = FakePort::new(&[], "a");
        assert!(matches!(port.exists("a"), Err(InputMethodError::Empty)));
    }
}
