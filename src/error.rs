//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the appsync CLI.
///
/// - 0: Success
/// - 1: General error (unexpected failure)
/// - 2: Generator unavailable (enrichment requested but no generator binary)
/// - 3: Partial success (batch finished with failed items)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed normally.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Enrichment was requested but the generator could not be located.
    GeneratorUnavailable = 2,
    /// The batch completed but some items failed.
    PartialSuccess = 3,
    /// Interrupted: the batch was stopped by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "AS000",
            Self::GeneralError => "AS001",
            Self::GeneratorUnavailable => "AS002",
            Self::PartialSuccess => "AS003",
            Self::Interrupted => "AS130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "AS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including the context chain
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
