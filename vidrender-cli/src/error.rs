// ============================================================================
// vidrender-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// The CLI reports vidrender-core errors directly. Failures that only exist at
// this layer (bad paths, setup problems) become `CoreError::OperationFailed`
// with the context folded into the message.
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - CliErrorContext: Adds context while converting to CoreError

// ---- Internal crate imports ----
use vidrender_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Adds a context prefix to an error while converting it to CoreError.
pub trait CliErrorContext<T> {
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{context}: {core_error}"))
        })
    }
}
