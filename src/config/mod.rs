//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and file loading
//! - [`validation`]: Startup checks across sections

mod types;
mod validation;

pub use types::{Config, FiltersConfig, LogConfig, LogFormat};
pub use validation::validate;
