//! # memdiag-log
//!
//! Logging setup shared by the memdiag binaries. Everything goes to stderr so
//! stdout stays reserved for report lines that downstream scripts scrape.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! fn main() -> memdiag_log::LogResult<()> {
//!     let _guard = memdiag_log::auto_init()?;
//!     memdiag_log::info!(pid = std::process::id(), "starting");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod builder;
mod config;
pub mod core;

// Public API
pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Format};
pub use crate::core::{LogError, LogResult};

// Re-export tracing macros
pub use tracing::{debug, error, info, instrument, span, trace, warn};

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Config, Format, LogResult, auto_init, debug, error, info, init, init_with, trace, warn,
    };
}

/// Pick a configuration from the environment and build type.
///
/// Returns a no-op guard when a global subscriber is already installed.
pub fn auto_init() -> LogResult<LoggerGuard> {
    if tracing::dispatcher::has_been_set() {
        return Ok(LoggerGuard::noop());
    }

    if std::env::var("MEMDIAG_LOG").is_ok() || std::env::var("RUST_LOG").is_ok() {
        init_with(Config::from_env())
    } else if cfg!(debug_assertions) {
        init_with(Config::development())
    } else {
        init_with(Config::default())
    }
}

/// Initialize with default configuration
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

/// Initialize with custom configuration
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}
