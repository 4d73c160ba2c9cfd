//! Configuration presets for common scenarios

use super::{Config, DisplayConfig, Format};

impl Config {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // MEMDIAG_LOG wins over RUST_LOG
        if let Some(level) = lookup("MEMDIAG_LOG").or_else(|| lookup("RUST_LOG")) {
            config.level = level;
        }

        if let Some(format) = lookup("MEMDIAG_LOG_FORMAT") {
            config.format = format.parse().unwrap_or(Format::Compact);
        }

        config.display.parse_env(&lookup);

        config
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                colors: true,
                source: true,
                ..DisplayConfig::default()
            },
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                ..DisplayConfig::default()
            },
        }
    }

    /// Test configuration (trace level, no colors or time)
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: "trace".to_string(),
            format: Format::Compact,
            display: DisplayConfig {
                colors: false,
                time: false,
                ..DisplayConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_memdiag_log_overrides_rust_log() {
        let config = Config::from_lookup(vars(&[
            ("RUST_LOG", "info"),
            ("MEMDIAG_LOG", "memdiag=trace"),
        ]));
        assert_eq!(config.level, "memdiag=trace");
    }

    #[test]
    fn test_rust_log_fallback() {
        let config = Config::from_lookup(vars(&[("RUST_LOG", "debug")]));
        assert_eq!(config.level, "debug");
    }

    #[rstest]
    #[case("json", Format::Json)]
    #[case("PRETTY", Format::Pretty)]
    #[case("logfmt", Format::Compact)]
    fn test_format_from_env(#[case] value: &str, #[case] expected: Format) {
        let config = Config::from_lookup(vars(&[("MEMDIAG_LOG_FORMAT", value)]));
        assert_eq!(config.format, expected);
    }

    #[test]
    fn test_display_flags_from_env() {
        let config = Config::from_lookup(vars(&[
            ("MEMDIAG_LOG_TIME", "0"),
            ("MEMDIAG_LOG_COLORS", "false"),
            ("MEMDIAG_LOG_SOURCE", "1"),
        ]));
        assert!(!config.display.time);
        assert!(!config.display.colors);
        assert!(config.display.source);
    }

    #[test]
    fn test_presets() {
        assert_eq!(Config::production().format, Format::Json);
        assert_eq!(Config::development().level, "debug");
        assert!(!Config::test().display.time);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: Config = serde_json::from_str(r#"{"level": "trace", "format": "json"}"#).unwrap();
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.display, DisplayConfig::default());
    }
}
