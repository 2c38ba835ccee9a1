//! Error types for command execution and registry construction.

use thiserror::Error;

/// Errors a command handler can report.
///
/// Without filters, the error reaches the dispatcher's caller. With at least
/// one filter attached it is captured into the [`ExecutionContext`] and only
/// filters get to see it.
///
/// [`ExecutionContext`]: crate::ExecutionContext
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command ran and could not complete.
    #[error("command failed: {0}")]
    Failed(String),

    /// The package did not carry what the command needs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Any other failure surfaced by the handler.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Failed(_) => "failed",
            Self::InvalidInput(_) => "invalid_input",
            Self::Other(_) => "internal_error",
        }
    }
}

/// Result type for command handlers.
pub type CommandResult = Result<(), CommandError>;

/// Fatal errors raised while building a [`CommandRegistry`].
///
/// These abort server startup; none of them can happen at request time.
///
/// [`CommandRegistry`]: crate::CommandRegistry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The construction capability failed to produce a handler.
    #[error("failed to construct command {command}: {source}")]
    Construct {
        /// Handler type name.
        command: &'static str,
        /// Factory error.
        #[source]
        source: anyhow::Error,
    },

    /// A handler reported a key that cannot route anything.
    #[error("command {command} reports an unusable key {key}")]
    UnusableKey {
        /// Handler type name.
        command: &'static str,
        /// Debug rendering of the key.
        key: String,
    },

    /// Two handlers resolved to the same key under the registry comparer.
    #[error("duplicate command key {key}: {first} and {second}")]
    DuplicateKey {
        /// Debug rendering of the canonical key.
        key: String,
        /// Handler registered first.
        first: &'static str,
        /// Handler that collided with it.
        second: &'static str,
    },
}
