//! Report configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ram::{FreeCommand, RamSource};

/// Environment variable selecting the RAM source
pub const ENV_RAM_SOURCE: &str = "MEMDIAG_RAM_SOURCE";
/// Environment variable overriding the memory command line
pub const ENV_FREE_COMMAND: &str = "MEMDIAG_FREE_COMMAND";
/// Environment variable enabling the RAM line in full reports
pub const ENV_INCLUDE_RAM: &str = "MEMDIAG_INCLUDE_RAM";

/// What a report contains and where RAM totals come from
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiagConfig {
    /// Source of system RAM totals
    pub ram_source: RamSource,
    /// Command used by [`RamSource::Command`] and as the `Auto` fallback
    pub free_command: FreeCommand,
    /// Append the RAM percentage line to [`crate::Reporter::report_all`]
    pub include_ram: bool,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            ram_source: RamSource::Auto,
            free_command: FreeCommand::default(),
            include_ram: false,
        }
    }
}

impl DiagConfig {
    /// Defaults overridden by `MEMDIAG_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns per variable.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(source) = lookup(ENV_RAM_SOURCE) {
            match source.parse() {
                Ok(source) => config.ram_source = source,
                Err(e) => tracing::warn!(error = %e, "ignoring {ENV_RAM_SOURCE}"),
            }
        }

        if let Some(line) = lookup(ENV_FREE_COMMAND) {
            match FreeCommand::parse(&line) {
                Ok(command) => config.free_command = command,
                Err(e) => tracing::warn!(error = %e, "ignoring {ENV_FREE_COMMAND}"),
            }
        }

        if let Some(v) = lookup(ENV_INCLUDE_RAM) {
            config.include_ram = v != "0" && !v.eq_ignore_ascii_case("false");
        }

        config
    }

    /// Read RAM totals only through the external command
    #[must_use]
    pub fn command_only(command: FreeCommand) -> Self {
        Self {
            ram_source: RamSource::Command,
            free_command: command,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        assert_eq!(DiagConfig::from_lookup(lookup(&[])), DiagConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = DiagConfig::from_lookup(lookup(&[
            (ENV_RAM_SOURCE, "command"),
            (ENV_FREE_COMMAND, "free -t -k"),
            (ENV_INCLUDE_RAM, "1"),
        ]));
        assert_eq!(config.ram_source, RamSource::Command);
        assert_eq!(config.free_command, FreeCommand::new("free", ["-t", "-k"]));
        assert!(config.include_ram);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = DiagConfig::from_lookup(lookup(&[
            (ENV_RAM_SOURCE, "procfs"),
            (ENV_FREE_COMMAND, "  "),
            (ENV_INCLUDE_RAM, "false"),
        ]));
        assert_eq!(config, DiagConfig::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial() {
        let config: DiagConfig =
            serde_json::from_str(r#"{"ram_source": "sysinfo", "include_ram": true}"#).unwrap();
        assert_eq!(config.ram_source, RamSource::Sysinfo);
        assert!(config.include_ram);
        assert_eq!(config.free_command, FreeCommand::default());
    }
}
