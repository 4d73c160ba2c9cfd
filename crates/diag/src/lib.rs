//! Memory diagnostics for interactive numeric experiments
//!
//! This crate answers three questions from a script or a debugging session:
//! - How much resident memory has this process ever used? (`maxrss`)
//! - Which tensors are alive right now, grouped by device, element type and shape?
//! - How full is system RAM?
//!
//! Answers are printed to standard output as plain lines so two runs can be
//! diffed when hunting leaks.
//!
//! # Features
//!
//! - `sysinfo` (default): read system RAM through a direct OS query
//! - `serde`: serialization support for [`DiagConfig`] and friends
//!
//! # Example
//!
//! ```no_run
//! use memdiag::{DType, Device, Tensor};
//!
//! fn main() -> memdiag::Result<()> {
//!     let weights = Tensor::zeros([512, 512], DType::Float32, Device::Cpu)?;
//!     let _bias = Tensor::zeros([512], DType::Float32, Device::Cpu)?;
//!     let _view = weights.reshape([256, 1024])?;
//!
//!     // maxrss = 10240
//!     // ('cpu', float32, (256, 1024))	1
//!     // ('cpu', float32, (512,))	1
//!     // ('cpu', float32, (512, 512))	1
//!     memdiag::debug_memory()?;
//!
//!     // RAM memory % used: 41.37
//!     memdiag::print_ram_usage()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod census;
pub mod config;
pub mod error;
pub mod ram;
pub mod registry;
pub mod report;
pub mod rusage;
pub mod tensor;

// Re-exports
pub use census::{Census, CensusDiff, GroupKey};
pub use config::DiagConfig;
pub use error::{Result, SystemError};
pub use ram::{FreeCommand, RamSource, RamUsage};
pub use registry::{TensorRegistry, Tracked};
pub use report::Reporter;
pub use rusage::{PeakMemory, RssUnit, max_rss};
pub use tensor::{DType, Device, Element, Shape, Tensor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Print `maxrss = <n>` for the current process
pub fn print_max_rss() -> Result<PeakMemory> {
    Reporter::stdout().report_max_rss()
}

/// Print one line per live tensor group in the global registry
pub fn print_tensor_census() -> Result<Census> {
    Reporter::stdout().report_census()
}

/// Print `RAM memory % used: <percent>`
///
/// The source and command come from [`DiagConfig::from_env`].
pub fn print_ram_usage() -> Result<f64> {
    Reporter::stdout().report_ram_usage()
}

/// Print peak memory, then the tensor census
pub fn debug_memory() -> Result<()> {
    Reporter::stdout().report_debug_memory()
}
