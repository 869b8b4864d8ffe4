//! Interpretation of the tool's free-text output.
//!
//! This is the only place that knows what pfgw prints. Everything else works
//! with [`PrpVerdict`].

use crate::error::ToolError;
use crate::types::{PrpVerdict, ToolOutput};

/// Identification marker pfgw prints in its banner.
pub const DEFAULT_MARKER: &str = "PFGW";

/// Turn `(exit_status, text)` into a verdict.
///
/// - marker present, exit 0 → [`PrpVerdict::ProbablePrime`]
/// - marker present, anything else → [`PrpVerdict::Composite`]
/// - marker absent → [`ToolError::MissingMarker`]
///
/// # Errors
/// Returns [`ToolError::MissingMarker`] when `marker` does not occur in the
/// output.
pub fn parse_verdict(query: &str, output: &ToolOutput, marker: &str) -> Result<PrpVerdict, ToolError> {
    if !output.text.contains(marker) {
        return Err(ToolError::MissingMarker {
            query: query.to_owned(),
            marker: marker.to_owned(),
            output: output.text.clone(),
        });
    }
    if output.success() {
        Ok(PrpVerdict::ProbablePrime)
    } else {
        Ok(PrpVerdict::Composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRP: &str = "PFGW Version 4.0.4.64BIT.20221007.x86_Dev [GWNUM 30.11]\n\n\
                       31#+1 is 3-PRP! (0.0001s+0.0002s)\n";
    const COMPOSITE: &str = "PFGW Version 4.0.4.64BIT.20221007.x86_Dev [GWNUM 30.11]\n\n\
                             503#-617 is composite: RES64: [0123456789ABCDEF] (0.0004s+0.0002s)\n";

    #[test]
    fn exit_zero_with_marker_is_prp() {
        let out = ToolOutput::new(Some(0), PRP);
        assert_eq!(
            parse_verdict("31#+1", &out, DEFAULT_MARKER).unwrap(),
            PrpVerdict::ProbablePrime
        );
    }

    #[test]
    fn nonzero_exit_with_marker_is_composite() {
        let out = ToolOutput::new(Some(1), COMPOSITE);
        assert_eq!(
            parse_verdict("503#-617", &out, DEFAULT_MARKER).unwrap(),
            PrpVerdict::Composite
        );
    }

    #[test]
    fn killed_process_with_marker_is_composite() {
        let out = ToolOutput::new(None, PRP);
        assert_eq!(
            parse_verdict("31#+1", &out, DEFAULT_MARKER).unwrap(),
            PrpVerdict::Composite
        );
    }

    #[test]
    fn missing_marker_is_an_error_even_on_success() {
        let out = ToolOutput::new(Some(0), "sh: pfgw64: command not found\n");
        let err = parse_verdict("31#+1", &out, DEFAULT_MARKER).unwrap_err();
        assert!(matches!(err, ToolError::MissingMarker { ref query, .. } if query == "31#+1"));
    }

    #[test]
    fn custom_marker() {
        let out = ToolOutput::new(Some(0), "MyPRP 1.0: 7 is PRP");
        assert!(parse_verdict("7", &out, DEFAULT_MARKER).is_err());
        assert_eq!(
            parse_verdict("7", &out, "MyPRP").unwrap(),
            PrpVerdict::ProbablePrime
        );
    }
}
