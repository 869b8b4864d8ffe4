//! The [`PrpTool`] trait: the boundary between the oracle and the external
//! probable-prime tester.
//!
//! The trait is object-safe so the oracle can hold a `Box<dyn PrpTool>` and
//! tests can substitute a scripted double.

use crate::error::ToolError;
use crate::types::{Probe, PrpVerdict, ToolOutput};
use crate::verdict::{DEFAULT_MARKER, parse_verdict};

/// Flags for an ordinary PRP query: no trial factoring.
pub const QUERY_FLAGS: &[&str] = &["-f0"];

/// Flags for a self-check probe: keep going on composites, no trial factoring.
pub const PROBE_FLAGS: &[&str] = &["-k", "-f0"];

/// An external probable-prime tester.
///
/// Implementations must be usable from several threads at once; each
/// [`invoke`](Self::invoke) is an independent process run.
pub trait PrpTool: Send + Sync {
    /// Short name used in log lines and error messages.
    fn name(&self) -> &str;

    /// Run the tool once on `query` with `flags`, returning its exit code and
    /// combined output. No interpretation happens here.
    ///
    /// # Errors
    /// Spawn failures, I/O failures and timeouts.
    fn invoke(&self, query: &str, flags: &[&str]) -> Result<ToolOutput, ToolError>;

    /// Identification marker expected in every output.
    fn marker(&self) -> &str {
        DEFAULT_MARKER
    }

    /// PRP-test `query`, an expression the tool understands (decimal digits or
    /// compact forms like `503#-659`).
    ///
    /// # Errors
    /// Any [`ToolError`] from [`invoke`](Self::invoke), or
    /// [`ToolError::MissingMarker`] when the output is not recognised.
    fn test_prp(&self, query: &str) -> Result<PrpVerdict, ToolError> {
        let output = self.invoke(query, QUERY_FLAGS)?;
        let verdict = parse_verdict(query, &output, self.marker())?;
        tracing::debug!(tool = self.name(), query_len = query.len(), %verdict, "prp query");
        Ok(verdict)
    }
}

/// Run every probe against `tool`; `true` only if all of them produce their
/// exact expected output. An empty probe list never passes.
pub fn self_check(tool: &dyn PrpTool, probes: &[Probe]) -> bool {
    if probes.is_empty() {
        tracing::warn!(tool = tool.name(), "no self-check probes configured");
        return false;
    }
    for probe in probes {
        match tool.invoke(&probe.query, PROBE_FLAGS) {
            Ok(output) if probe.matches(&output) => {}
            Ok(output) => {
                tracing::warn!(
                    tool = tool.name(),
                    query = %probe.query,
                    exit_code = ?output.exit_code,
                    "self-check probe mismatch"
                );
                return false;
            }
            Err(e) => {
                tracing::warn!(tool = tool.name(), query = %probe.query, error = %e, "self-check probe failed");
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::types::default_probes;

    /// Replays canned outputs and records the flags it was called with.
    struct Canned {
        outputs: Mutex<Vec<ToolOutput>>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl Canned {
        fn new(mut outputs: Vec<ToolOutput>) -> Self {
            outputs.reverse();
            Self {
                outputs: Mutex::new(outputs),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl PrpTool for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn invoke(&self, query: &str, flags: &[&str]) -> Result<ToolOutput, ToolError> {
            self.calls.lock().unwrap().push((
                query.to_owned(),
                flags.iter().map(|f| (*f).to_owned()).collect(),
            ));
            Ok(self
                .outputs
                .lock()
                .unwrap()
                .pop()
                .expect("more invocations than canned outputs"))
        }
    }

    fn good_probe_outputs() -> Vec<ToolOutput> {
        vec![
            ToolOutput::new(Some(0), "PFGW Version 4\n10^700 + 7 is 3-PRP! (0.0s)\n"),
            ToolOutput::new(
                Some(1),
                "PFGW Version 4\n10^700 + 3 is composite: RES64: [44B46CC0948A0831] (0.0s)\n",
            ),
        ]
    }

    #[test]
    fn self_check_passes_on_exact_outputs() {
        let tool = Canned::new(good_probe_outputs());
        assert!(self_check(&tool, &default_probes()));

        let calls = tool.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "10^700 + 7");
        assert_eq!(calls[0].1, vec!["-k", "-f0"]);
    }

    #[test]
    fn self_check_fails_on_wrong_residue() {
        let mut outputs = good_probe_outputs();
        outputs[1] = ToolOutput::new(
            Some(1),
            "PFGW Version 4\n10^700 + 3 is composite: RES64: [0000000000000000]\n",
        );
        let tool = Canned::new(outputs);
        assert!(!self_check(&tool, &default_probes()));
    }

    #[test]
    fn self_check_stops_at_first_mismatch() {
        let tool = Canned::new(vec![ToolOutput::new(Some(1), "PFGW\n10^700 + 7 is composite")]);
        assert!(!self_check(&tool, &default_probes()));
        assert_eq!(tool.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn self_check_with_no_probes_fails() {
        let tool = Canned::new(Vec::new());
        assert!(!self_check(&tool, &[]));
    }

    #[test]
    fn test_prp_uses_query_flags() {
        let tool = Canned::new(vec![ToolOutput::new(Some(0), "PFGW\n31#+1 is 3-PRP!")]);
        assert_eq!(tool.test_prp("31#+1").unwrap(), PrpVerdict::ProbablePrime);
        assert_eq!(tool.calls.lock().unwrap()[0].1, vec!["-f0"]);
    }
}
