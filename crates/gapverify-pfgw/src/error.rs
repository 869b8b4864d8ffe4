//! Error types for PRP tool invocations.
//!
//! [`ToolError`] is the single error type returned by all [`PrpTool`](crate::PrpTool)
//! methods. None of its variants are retryable: once the tool misbehaves the
//! verdict it would produce can no longer be trusted.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`PrpTool`](crate::PrpTool) operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool binary could not be started (missing from `PATH`, not
    /// executable, ...).
    #[error("could not run `{}`: {source}", program.display())]
    Spawn {
        /// The program that was invoked.
        program: PathBuf,
        /// The underlying spawn error.
        source: std::io::Error,
    },

    /// The tool ran but its output did not contain the identification marker.
    ///
    /// The tool is broken or is not the tool we think it is. Treating this as
    /// "composite" would silently accept a bogus gap, so it is always fatal.
    #[error("output for `{query}` lacks the `{marker}` marker: {output:?}")]
    MissingMarker {
        /// The expression that was queried.
        query: String,
        /// The marker that was expected.
        marker: String,
        /// The combined stdout/stderr text that was produced.
        output: String,
    },

    /// The tool did not finish within the configured timeout and was killed.
    #[error("`{query}` did not finish within {seconds}s")]
    TimedOut {
        /// The expression that was queried.
        query: String,
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// Waiting on or reading from the child process failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
