//! Value types used in [`PrpTool`](crate::PrpTool) signatures.

use std::fmt;

// ---------------------------------------------------------------------------
// ToolOutput
// ---------------------------------------------------------------------------

/// Raw result of one tool invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutput {
    /// Process exit code. `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// stdout followed by stderr, lossily decoded.
    pub text: String,
}

impl ToolOutput {
    /// Create an output record.
    pub fn new(exit_code: Option<i32>, text: impl Into<String>) -> Self {
        Self {
            exit_code,
            text: text.into(),
        }
    }

    /// `true` when the process exited with status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

// ---------------------------------------------------------------------------
// PrpVerdict
// ---------------------------------------------------------------------------

/// What the tool concluded about a single query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrpVerdict {
    /// The tool reported a probable prime (exit status 0).
    ProbablePrime,
    /// Any other outcome that still carried the tool's marker.
    Composite,
}

impl PrpVerdict {
    /// `true` for [`PrpVerdict::ProbablePrime`].
    #[must_use]
    pub const fn is_probable_prime(self) -> bool {
        matches!(self, Self::ProbablePrime)
    }
}

impl fmt::Display for PrpVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProbablePrime => write!(f, "probable prime"),
            Self::Composite => write!(f, "composite"),
        }
    }
}

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

/// A fixed query with a known answer, used to check that the installed tool
/// behaves the way [`parse_verdict`](crate::parse_verdict) expects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Probe {
    /// Expression passed to the tool.
    pub query: String,
    /// Exit code the tool must return.
    pub exit_code: i32,
    /// Literal text that must appear in the tool's output.
    pub expect: String,
}

impl Probe {
    /// Create a probe.
    pub fn new(query: impl Into<String>, exit_code: i32, expect: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            exit_code,
            expect: expect.into(),
        }
    }

    /// Does `output` match this probe exactly?
    #[must_use]
    pub fn matches(&self, output: &ToolOutput) -> bool {
        output.exit_code == Some(self.exit_code) && output.text.contains(&self.expect)
    }
}

/// The two reference probes for pfgw64: a 701-digit 3-PRP and a composite
/// neighbour with a known RES64 residue.
#[must_use]
pub fn default_probes() -> Vec<Probe> {
    vec![
        Probe::new("10^700 + 7", 0, "10^700 + 7 is 3-PRP! "),
        Probe::new(
            "10^700 + 3",
            1,
            "10^700 + 3 is composite: RES64: [44B46CC0948A0831]",
        ),
    ]
}
