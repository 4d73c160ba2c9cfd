//! Error handling for memdiag-log

use thiserror::Error;

/// Errors raised while setting up logging
#[derive(Debug, Error)]
pub enum LogError {
    /// Filter directive could not be parsed
    #[error("Invalid filter '{filter}': {reason}")]
    Filter {
        /// Directive as given
        filter: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber was already installed
    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for logger operations
pub type LogResult<T> = Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_error_messages() {
        let error = LogError::Filter {
            filter: "debug,,=".to_string(),
            reason: "invalid directive".to_string(),
        };
        assert!(error.to_string().contains("Invalid filter 'debug,,='"));

        let error = LogError::Config("unknown format 'xml'".to_string());
        assert_eq!(error.to_string(), "Configuration error: unknown format 'xml'");
    }
}
