//! Core types for the logging setup.

pub mod error;

pub use error::{LogError, LogResult};
