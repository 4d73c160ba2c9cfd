//! Logger builder implementation

#[macro_use]
mod format;

// External dependencies
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

// Internal crates
use crate::config::{Config, Format};
use crate::core::{LogError, LogResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Guard that keeps the logger alive
///
/// Events emitted after the guard is dropped are still delivered; the guard
/// exists so callers keep the same shape when writers gain buffering.
#[derive(Debug)]
#[must_use = "dropping the guard immediately is almost never intended"]
pub struct LoggerGuard {
    level: Option<String>,
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Override the filter directive
    #[must_use]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// Override the output format
    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.config.format = format;
        self
    }

    /// Build the filter without installing anything
    pub fn filter(&self) -> LogResult<EnvFilter> {
        EnvFilter::try_new(&self.config.level).map_err(|e| LogError::Filter {
            filter: self.config.level.clone(),
            reason: e.to_string(),
        })
    }

    /// Build and install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Filter string cannot be parsed
    /// - A global subscriber is already installed
    pub fn build(self) -> LogResult<LoggerGuard> {
        let filter = self.filter()?;

        let display = &self.config.display;
        let fmt_layer: BoxedLayer = match self.config.format {
            Format::Pretty => create_fmt_layer!(pretty, display),
            Format::Compact => create_fmt_layer!(compact, display),
            Format::Json => create_fmt_layer!(json, display),
        };

        Registry::default()
            .with(fmt_layer)
            .with(filter)
            .try_init()
            .map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

        tracing::debug!(level = %self.config.level, format = ?self.config.format, "logger initialized");

        Ok(LoggerGuard {
            level: Some(self.config.level),
        })
    }
}

impl LoggerGuard {
    /// Guard for when a subscriber was already installed elsewhere
    pub(crate) fn noop() -> Self {
        Self { level: None }
    }

    /// Filter directive this guard installed, if it installed one
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected_before_install() {
        let builder = LoggerBuilder::from_config(Config::test()).level("memdiag=notalevel");
        let err = builder.filter().unwrap_err();
        assert!(matches!(err, LogError::Filter { .. }), "{err}");
    }

    #[test]
    fn test_builder_overrides() {
        let builder = LoggerBuilder::from_config(Config::default())
            .level("debug")
            .format(Format::Json);
        assert!(builder.filter().is_ok());
        assert_eq!(builder.config.format, Format::Json);
    }

    #[test]
    fn test_noop_guard_has_no_level() {
        assert_eq!(LoggerGuard::noop().level(), None);
    }
}
