//! Primality oracle: the built-in test on primorial primes, and the external
//! tool path against a scripted stand-in for pfgw64.

use gapverify::parse::{parse, parse_standard_form};
use gapverify::primality::is_probable_prime;
use gapverify::{GapValidator, PrimalityOracle, Strategy, ValidateOptions, Verdict, VerifyError};

#[test]
fn primorial_prime_table() {
    for (expr, prime) in [
        ("31# + 1", true),
        ("379# + 1", true),
        ("1019# + 1", true),
        ("2657# + 1", true),
        ("503# - 617", false),
        ("503# - 631", false),
        ("503# - 659", true),
        ("503# - 661", false),
    ] {
        let n = parse(expr).unwrap();
        assert_eq!(is_probable_prime(&n), prime, "{expr}");
    }
}

#[test]
fn default_oracle_stays_built_in_below_threshold() {
    let oracle = PrimalityOracle::default();
    let n = parse("2657# + 1").unwrap();
    assert!(n.bits() < oracle.threshold_bits());
    assert_eq!(oracle.strategy_for(&n), Strategy::FastPath);
    assert!(oracle.is_prime(&n).unwrap());
}

#[cfg(unix)]
mod scripted_tool {
    use std::fs;
    use std::os::unix::fs::PermissionsExt as _;
    use std::path::{Path, PathBuf};

    use gapverify_pfgw::Pfgw;
    use tempfile::TempDir;

    use super::*;

    /// A pfgw64 stand-in that answers the two reference probes correctly and
    /// reports every query listed in `primes` as 3-PRP. Each query is logged
    /// to `queries.log` in the same directory.
    fn fake_pfgw(dir: &TempDir, primes: &[&str]) -> PathBuf {
        let log = dir.path().join("queries.log");
        let cases: String = primes
            .iter()
            .map(|p| format!("  \"-q{p}\") echo \"{p} is 3-PRP!\"; exit 0 ;;\n"))
            .collect();
        let script = format!(
            r#"#!/bin/sh
echo "PFGW Version 4.0.4.64BIT"
if [ "$1" = "-k" ]; then
  case "$3" in
    "-q10^700 + 7") echo "10^700 + 7 is 3-PRP! (0.1s)"; exit 0 ;;
    "-q10^700 + 3") echo "10^700 + 3 is composite: RES64: [44B46CC0948A0831] (0.1s)"; exit 1 ;;
  esac
  exit 2
fi
echo "$2" >> "{log}"
case "$2" in
{cases}esac
echo "${{2#-q}} is composite: RES64: [0000000000000000]"
exit 1
"#,
            log = log.display(),
        );
        let path = dir.path().join("pfgw64");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn logged_queries(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("queries.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn large_numbers_go_to_the_tool() {
        let dir = TempDir::new().unwrap();
        let oracle = PrimalityOracle::with_tool(Pfgw::new(fake_pfgw(&dir, &["31# + 1"]))).with_threshold_bits(8);

        let n = parse("31# + 1").unwrap();
        assert!(oracle.is_prime_large(&n, Some("31# + 1")).unwrap());
        assert!(!oracle.is_prime_large(&n, None).unwrap());
        // Small numbers never reach the tool.
        assert!(oracle.is_prime(&parse("7").unwrap()).unwrap());

        assert_eq!(logged_queries(dir.path()), vec!["-q31# + 1", "-q200560490131"]);
    }

    #[test]
    fn form_queries_are_shifted_per_offset() {
        let dir = TempDir::new().unwrap();
        let tool = Pfgw::new(fake_pfgw(&dir, &["31# + 1", "31# + 67"]));
        let oracle = PrimalityOracle::with_tool(tool).with_threshold_bits(8);
        let validator = GapValidator::new(&oracle);

        let form = parse_standard_form("31# + 1").unwrap();
        let report = validator.validate_form(&form, 66, &ValidateOptions::default()).unwrap();
        assert_eq!(report.verdict, Verdict::Valid);

        let queries = logged_queries(dir.path());
        assert_eq!(queries[0], "-q31# + 1");
        assert_eq!(queries[1], "-q31# + 67");
        assert_eq!(queries.len() as u64, 2 + report.tested);
        assert!(queries[2..].iter().all(|q| q.starts_with("-q31# + ")));
    }

    #[test]
    fn failing_self_check_blocks_queries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pfgw64");
        fs::write(&path, "#!/bin/sh\necho \"PFGW Version 4.0\"\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        let oracle = PrimalityOracle::with_tool(Pfgw::new(path)).with_threshold_bits(8);
        let err = oracle.is_prime(&parse("31# + 1").unwrap()).unwrap_err();
        assert!(matches!(err, VerifyError::ToolUnavailable { .. }), "{err}");
        assert!(!oracle.check_tool_available());
    }

    #[test]
    fn missing_tool_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let oracle = PrimalityOracle::with_tool(Pfgw::new(dir.path().join("nope"))).with_threshold_bits(8);
        assert!(!oracle.check_tool_available());
        assert!(oracle.is_prime(&parse("31# + 1").unwrap()).is_err());
    }
}

mod real_pfgw {
    use super::*;

    #[test]
    #[ignore = "needs pfgw64 on PATH"]
    fn self_check_passes() {
        assert!(PrimalityOracle::default().check_tool_available());
    }

    #[test]
    #[ignore = "needs pfgw64 on PATH"]
    fn agrees_with_built_in_test() {
        let oracle = PrimalityOracle::default().with_threshold_bits(8);
        for expr in ["31# + 1", "379# + 1", "503# - 617", "503# - 659"] {
            let n = parse(expr).unwrap();
            assert_eq!(
                oracle.is_prime_large(&n, Some(expr)).unwrap(),
                is_probable_prime(&n),
                "{expr}"
            );
        }
    }
}
