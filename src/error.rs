//! Error type shared by the core and the CLI layers.
//!
//! Every variant maps to a process exit code so `main.rs` can stay a thin
//! wrapper. Optimizer non-convergence is deliberately *not* an error: it is
//! reported as a [`crate::fit::FitWarning`] next to a usable result.

use thiserror::Error;

#[derive(Clone, Error)]
pub enum AppError {
    /// A material or shape parameter violates its admissible range.
    #[error("Invalid parameter range: {0}")]
    InvalidParameterRange(String),

    /// Not enough target samples beyond the ultimate point to fit a softening law.
    #[error("Insufficient target data: {0}")]
    InsufficientTargetData(String),

    /// Malformed input values (target curve rows, CLI values).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File system or serialization failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::InvalidParameterRange(_) | AppError::InvalidInput(_) => 2,
            AppError::InsufficientTargetData(_) => 3,
            AppError::Io(_) => 4,
        }
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code())
            .field("message", &self.to_string())
            .finish()
    }
}
