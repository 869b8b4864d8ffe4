//! Error types for gap verification.
//!
//! [`VerifyError`] covers the conditions that abort a call outright. A gap
//! that simply fails to verify is *not* an error: it comes back as
//! [`Verdict::Invalid`](crate::validate::Verdict::Invalid).

use gapverify_pfgw::ToolError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Errors that abort a sieve, oracle or validation call.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// An input violated the call contract (`gap < 1`, bound `< 2`, ...).
    /// Raised before any work is done.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the input.
        message: String,
    },

    /// The sieve left an even number above 2 unmarked. This cannot happen for
    /// valid inputs and means the sieve itself is broken.
    #[error("sieve inconsistency: even value at offset {offset} not marked composite")]
    SieveInconsistency {
        /// Interval offset of the offending value.
        offset: u64,
    },

    /// The external PRP tool failed or produced unrecognisable output.
    #[error("PRP tool failure: {0}")]
    Tool(#[from] ToolError),

    /// The external PRP tool did not pass its self-check, so its answers
    /// cannot be trusted.
    #[error("PRP tool `{program}` is not available or failed its self-check")]
    ToolUnavailable {
        /// The tool that was probed.
        program: String,
    },
}

impl VerifyError {
    /// Create an [`VerifyError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// `true` for errors caused by the caller's input rather than by the
    /// verifier or its tools.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
