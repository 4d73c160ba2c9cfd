//! Configuration types
//!
//! - `base`: core configuration structs (Config, Format, DisplayConfig)
//! - `presets`: pre-configured setups (development, production, test)

mod base;
mod presets;

pub use base::{Config, DisplayConfig, Format};
