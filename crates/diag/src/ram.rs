//! System-wide RAM usage
//!
//! Memory totals come from a direct OS query through `sysinfo` when that
//! feature is enabled, or from a `free`-style command whose last output line
//! looks like `Total:  15892  4012  9870` (megabytes).

use std::fmt;
use std::process::Command;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SystemError};

#[cfg(feature = "sysinfo")]
const MIB: u64 = 1024 * 1024;

/// Where RAM totals are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RamSource {
    /// `sysinfo`, falling back to the command when it yields nothing
    #[default]
    Auto,
    /// Direct OS query only
    Sysinfo,
    /// External command only
    Command,
}

impl fmt::Display for RamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Sysinfo => "sysinfo",
            Self::Command => "command",
        })
    }
}

impl FromStr for RamSource {
    type Err = SystemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sysinfo" => Ok(Self::Sysinfo),
            "command" | "free" => Ok(Self::Command),
            _ => Err(SystemError::InvalidInput(format!("unknown RAM source '{s}'"))),
        }
    }
}

/// External command reporting memory in megabytes
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FreeCommand {
    /// Program to run
    pub program: String,
    /// Arguments passed to it
    pub args: Vec<String>,
}

impl FreeCommand {
    /// Arbitrary program and arguments
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a whitespace-separated command line
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| SystemError::InvalidInput("empty memory command".to_string()))?;
        Ok(Self::new(program, parts))
    }
}

impl Default for FreeCommand {
    fn default() -> Self {
        Self::new("free", ["-t", "-m"])
    }
}

impl fmt::Display for FreeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// System memory totals in megabytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RamUsage {
    /// Total memory
    pub total_mb: u64,
    /// Used memory
    pub used_mb: u64,
    /// Free memory
    pub free_mb: u64,
    /// Where the numbers came from
    pub source: RamSource,
}

impl RamUsage {
    /// Read totals from `source`
    pub fn query(source: RamSource, command: &FreeCommand) -> Result<Self> {
        match source {
            RamSource::Sysinfo => Self::from_sysinfo(),
            RamSource::Command => Self::from_command(command),
            RamSource::Auto => Self::from_sysinfo().or_else(|e| {
                tracing::debug!(error = %e, command = %command, "sysinfo unavailable, running command");
                Self::from_command(command)
            }),
        }
    }

    /// Direct OS query
    #[cfg(feature = "sysinfo")]
    pub fn from_sysinfo() -> Result<Self> {
        let mut sys = SYSINFO_SYSTEM.write();
        sys.refresh_memory();

        let total = sys.total_memory();
        if total == 0 {
            return Err(SystemError::NotSupported(
                "sysinfo reported no physical memory".to_string(),
            ));
        }
        let usage = Self {
            total_mb: total / MIB,
            used_mb: sys.used_memory() / MIB,
            free_mb: sys.free_memory() / MIB,
            source: RamSource::Sysinfo,
        };
        tracing::trace!(total_mb = usage.total_mb, used_mb = usage.used_mb, "sysinfo memory");
        Ok(usage)
    }

    /// Direct OS query (requires the `sysinfo` feature)
    #[cfg(not(feature = "sysinfo"))]
    pub fn from_sysinfo() -> Result<Self> {
        Err(SystemError::NotSupported(
            "sysinfo feature not enabled".to_string(),
        ))
    }

    /// Run `command` and parse the last line of its output
    pub fn from_command(command: &FreeCommand) -> Result<Self> {
        tracing::debug!(command = %command, "running memory command");
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()?;

        if !output.status.success() {
            return Err(SystemError::CommandFailed {
                command: command.to_string(),
                status: output.status.to_string(),
            });
        }

        Self::parse_free_output(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parse `free -t -m` output: the last line holds a label then
    /// total, used and free.
    pub fn parse_free_output(output: &str) -> Result<Self> {
        let line = output
            .lines()
            .last()
            .ok_or_else(|| SystemError::Parse("memory command printed nothing".to_string()))?;

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [_label, total, used, free] = fields.as_slice() else {
            return Err(SystemError::parse(
                "memory totals",
                line,
                format!("expected a label and 3 fields, found {} tokens", fields.len()),
            ));
        };

        let number = |field: &str| {
            field
                .parse::<u64>()
                .map_err(|e| SystemError::parse("memory totals", line, e))
        };

        Ok(Self {
            total_mb: number(*total)?,
            used_mb: number(*used)?,
            free_mb: number(*free)?,
            source: RamSource::Command,
        })
    }

    /// `used / total` as a percentage rounded to two decimals
    pub fn percent_used(&self) -> Result<f64> {
        if self.total_mb == 0 {
            return Err(SystemError::InvalidInput(
                "total memory is zero".to_string(),
            ));
        }
        Ok(round2(self.used_mb as f64 / self.total_mb as f64 * 100.0))
    }
}

/// Round half away from zero to two decimals
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(feature = "sysinfo")]
static SYSINFO_SYSTEM: std::sync::LazyLock<parking_lot::RwLock<sysinfo::System>> =
    std::sync::LazyLock::new(|| parking_lot::RwLock::new(sysinfo::System::new()));
