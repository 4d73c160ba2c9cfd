//! `memdiag` command-line front end
//!
//! Report lines go to stdout, logs go to stderr.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use memdiag::{
    Census, DType, DiagConfig, Device, FreeCommand, RamSource, Reporter, Shape, TensorRegistry,
};
use memdiag_log::{Config as LogConfig, Format as LogFormat, LoggerBuilder, LoggerGuard};

#[derive(Parser, Debug)]
#[command(
    name = "memdiag",
    about = "Print peak RSS, live tensor groups and system RAM usage",
    version,
    disable_help_subcommand = true
)]
struct Cli {
    /// Log filter directive, e.g. `debug` or `memdiag=trace`
    #[arg(long, global = true, env = "MEMDIAG_LOG")]
    log_level: Option<String>,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Peak RSS followed by the tensor census
    Report {
        /// Also print the system RAM percentage
        #[arg(long)]
        ram: bool,

        #[command(flatten)]
        source: RamArgs,
    },

    /// Peak resident set size of this process
    Maxrss,

    /// System RAM percentage in use
    Ram {
        #[command(flatten)]
        source: RamArgs,
    },

    /// Allocate a batch of tensors and print the census
    Demo {
        /// Tensors to allocate
        #[arg(long, default_value_t = 3)]
        count: usize,

        /// Dimensions, e.g. `2,3` or `(4,)`
        #[arg(long, default_value = "2,3")]
        shape: Shape,

        /// Element type
        #[arg(long, default_value = "float32")]
        dtype: DType,

        /// Device, e.g. `cpu`, `cuda:1` or `meta`
        #[arg(long, default_value = "cpu")]
        device: Device,

        /// Also keep a flattened view of each tensor alive
        #[arg(long)]
        flatten: bool,
    },
}

#[derive(Args, Debug)]
struct RamArgs {
    /// Where RAM totals come from (auto, sysinfo, command)
    #[arg(long)]
    source: Option<RamSource>,

    /// Command line printing `free -t -m` style output
    #[arg(long = "free-command", value_name = "COMMAND")]
    free_command: Option<String>,
}

impl RamArgs {
    /// Layer the flags over the environment configuration
    fn apply(&self, mut config: DiagConfig) -> Result<DiagConfig> {
        if let Some(source) = self.source {
            config.ram_source = source;
        }
        if let Some(line) = &self.free_command {
            config.free_command =
                FreeCommand::parse(line).with_context(|| format!("invalid --free-command '{line}'"))?;
        }
        Ok(config)
    }
}

fn init_logging(cli: &Cli) -> Result<LoggerGuard> {
    let mut builder = LoggerBuilder::from_config(LogConfig::from_env());
    if let Some(level) = &cli.log_level {
        builder = builder.level(level.clone());
    }
    if let Some(format) = cli.log_format {
        builder = builder.format(format);
    }
    builder.build().context("failed to initialize logging")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli)?;

    tracing::debug!(command = ?cli.command, version = memdiag::VERSION, "memdiag starting");

    let stdout = io::stdout();
    let config = DiagConfig::from_env();

    match &cli.command {
        Command::Report { ram, source } => {
            let mut config = source.apply(config)?;
            config.include_ram |= *ram;
            Reporter::new(stdout.lock())
                .with_config(config)
                .report_all()
                .context("memory report failed")?;
        }
        Command::Maxrss => {
            Reporter::new(stdout.lock())
                .report_max_rss()
                .context("failed to read peak RSS")?;
        }
        Command::Ram { source } => {
            let config = source.apply(config)?;
            Reporter::new(stdout.lock())
                .with_config(config)
                .report_ram_usage()
                .context("failed to read system RAM usage")?;
        }
        Command::Demo {
            count,
            shape,
            dtype,
            device,
            flatten,
        } => run_demo(*count, shape, *dtype, *device, *flatten)?,
    }

    io::stdout().flush()?;
    Ok(())
}

fn run_demo(count: usize, shape: &Shape, dtype: DType, device: Device, flatten: bool) -> Result<()> {
    let registry = TensorRegistry::new();
    let before = Census::collect(&registry);

    let mut live = Vec::with_capacity(count.saturating_mul(2));
    for _ in 0..count {
        let tensor = registry.zeros(shape.clone(), dtype, device)?;
        if flatten {
            live.push(tensor.reshape([tensor.numel()])?);
        }
        live.push(tensor);
    }

    let mut reporter = Reporter::new(io::stdout().lock()).with_registry(registry.clone());
    reporter.report_debug_memory()?;

    let after = Census::collect(&registry);
    tracing::info!(
        allocated = live.len(),
        groups = after.len(),
        net = after.diff(&before).net(),
        "demo tensors allocated"
    );

    drop(live);
    tracing::debug!(remaining = registry.live_count(), "demo tensors dropped");
    Ok(())
}
