//! Line-oriented reports
//!
//! Each `report_*` method gathers everything it needs first and only then
//! writes, so a failing query leaves the output untouched.

use std::io::{self, Write};

use crate::census::Census;
use crate::config::DiagConfig;
use crate::error::Result;
use crate::ram::RamUsage;
use crate::registry::TensorRegistry;
use crate::rusage::{self, PeakMemory};

/// Label of the RAM percentage line
pub const RAM_LABEL: &str = "RAM memory % used:";

/// Writes diagnostic lines to `W`
#[derive(Debug)]
pub struct Reporter<W> {
    out: W,
    config: DiagConfig,
    registry: TensorRegistry,
}

impl Reporter<io::Stdout> {
    /// Reporter on standard output, configured from the environment
    pub fn stdout() -> Self {
        Self::new(io::stdout()).with_config(DiagConfig::from_env())
    }
}

impl<W: Write> Reporter<W> {
    /// Reporter over the global registry with default configuration
    pub fn new(out: W) -> Self {
        Self {
            out,
            config: DiagConfig::default(),
            registry: TensorRegistry::global().clone(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: DiagConfig) -> Self {
        self.config = config;
        self
    }

    /// Count tensors from `registry` instead of the global one
    pub fn with_registry(mut self, registry: TensorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &DiagConfig {
        &self.config
    }

    /// `maxrss = <n>`
    pub fn report_max_rss(&mut self) -> Result<PeakMemory> {
        let peak = rusage::max_rss()?;
        writeln!(self.out, "{peak}")?;
        Ok(peak)
    }

    /// One `<key>\t<count>` line per tensor group
    pub fn report_census(&mut self) -> Result<Census> {
        let census = Census::collect(&self.registry);
        write!(self.out, "{census}")?;
        Ok(census)
    }

    /// `RAM memory % used: <percent>`
    pub fn report_ram_usage(&mut self) -> Result<f64> {
        let usage = RamUsage::query(self.config.ram_source, &self.config.free_command)?;
        let percent = usage.percent_used()?;
        tracing::debug!(
            source = %usage.source,
            total_mb = usage.total_mb,
            used_mb = usage.used_mb,
            percent,
            "system RAM usage"
        );
        writeln!(self.out, "{}", ram_line(percent))?;
        Ok(percent)
    }

    /// Peak memory followed by the tensor census
    pub fn report_debug_memory(&mut self) -> Result<()> {
        self.report_max_rss()?;
        self.report_census()?;
        Ok(())
    }

    /// [`report_debug_memory`](Self::report_debug_memory), plus the RAM line
    /// when `include_ram` is set
    pub fn report_all(&mut self) -> Result<()> {
        self.report_debug_memory()?;
        if self.config.include_ram {
            self.report_ram_usage()?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Percentages print in shortest round-trip form: `25.0`, `33.33`.
pub fn ram_line(percent: f64) -> String {
    format!("{RAM_LABEL} {percent:?}")
}
