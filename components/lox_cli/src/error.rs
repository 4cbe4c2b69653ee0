//! Error types for the CLI

use core_types::InterpretError;
use thiserror::Error;

/// Exit code for an unreadable input file
pub const EXIT_IO: i32 = 74;

/// Exit code for bad command-line usage
pub const EXIT_USAGE: i32 = 64;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Source compile or runtime failure
    #[error(transparent)]
    Interpret(#[from] InterpretError),

    /// Script file could not be read
    #[error("Could not read file \"{path}\": {source}")]
    Io {
        /// Path as given on the command line
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Line editor failure
    #[error("REPL error: {0}")]
    Repl(String),
}

impl CliError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Interpret(InterpretError::Compile(_)) => 72,
            CliError::Interpret(InterpretError::Runtime(_)) => 73,
            CliError::Io { .. } | CliError::Repl(_) => EXIT_IO,
        }
    }

    /// Text written to stderr; runtime errors include their backtrace
    pub fn report(&self) -> String {
        match self {
            CliError::Interpret(InterpretError::Runtime(err)) => err.report(),
            other => other.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
