//! Error types for diagnostic operations

use thiserror::Error;

/// Main error type for diagnostic operations
#[derive(Error, Debug)]
pub enum SystemError {
    /// I/O error (writing a report, spawning a command)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Platform-specific error
    #[error("Platform error: {message}")]
    Platform {
        /// Error message
        message: String,
        /// OS error code if available
        code: Option<i32>,
    },

    /// Feature not supported on this platform
    #[error("Not supported on this platform: {0}")]
    NotSupported(String),

    /// External command exited unsuccessfully
    #[error("Command `{command}` failed with {status}")]
    CommandFailed {
        /// Command line that was run
        command: String,
        /// Exit status as reported by the OS
        status: String,
    },

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for diagnostic operations
pub type Result<T> = std::result::Result<T, SystemError>;

impl SystemError {
    /// Create a platform error from OS error
    pub fn from_os_error(err: &std::io::Error) -> Self {
        Self::Platform {
            message: err.to_string(),
            code: err.raw_os_error(),
        }
    }

    /// Create a parse error with the offending input attached
    pub(crate) fn parse(what: &str, input: &str, reason: impl std::fmt::Display) -> Self {
        Self::Parse(format!("{what}: {reason} (input: {input:?})"))
    }

    /// OS error code, if this error carries one
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Io(e) => e.raw_os_error(),
            Self::Platform { code, .. } => *code,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_from_os_error_keeps_code() {
        let err = io::Error::from_raw_os_error(libc_einval());
        let error = SystemError::from_os_error(&err);
        assert!(matches!(error, SystemError::Platform { .. }));
        assert_eq!(error.os_code(), Some(libc_einval()));
    }

    #[test]
    fn test_parse_error_message() {
        let error = SystemError::parse("free output", "Total: x", "expected integer");
        let msg = error.to_string();
        assert!(msg.starts_with("Parse error: free output"));
        assert!(msg.contains("Total: x"));
    }

    #[test]
    fn test_command_failed_display() {
        let error = SystemError::CommandFailed {
            command: "free -t -m".to_string(),
            status: "exit status: 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Command `free -t -m` failed with exit status: 1"
        );
    }

    fn libc_einval() -> i32 {
        22
    }
}
