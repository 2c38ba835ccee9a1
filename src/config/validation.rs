//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("filters.{first} and filters.{second} share order {order}")]
    DuplicateFilterOrder {
        first: &'static str,
        second: &'static str,
        order: i32,
    },
    #[error("log.level is not a valid filter directive: '{0}'")]
    InvalidLogLevel(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Stock filters must run in a well-defined order
    let enabled: Vec<_> = config.filters.enabled().collect();
    for (i, &(first, order)) in enabled.iter().enumerate() {
        if let Some(&(second, _)) = enabled[i + 1..].iter().find(|(_, o)| *o == order) {
            errors.push(ValidationError::DuplicateFilterOrder {
                first,
                second,
                order,
            });
        }
    }

    if config.log.level.trim().is_empty() || EnvFilter::try_new(&config.log.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.log.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
