use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use gapverify::PrimalityOracle;
use gapverify::config::VerifyConfig;
use serde::Serialize;

use crate::format::OutputFormat;

const PFGW_URL: &str = "https://sourceforge.net/projects/openpfgw/";

#[derive(Serialize)]
struct DoctorEnvelope {
    checks: Vec<DoctorCheck>,
    all_ok: bool,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<String>,
}

impl DoctorCheck {
    fn new(name: &str, status: &str, message: String, fix: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status: status.to_string(),
            message,
            fix,
        }
    }
}

fn print_check(check: &DoctorCheck) {
    let prefix = match check.status.as_str() {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "fail" => "[FAIL]",
        _ => "[???]",
    };
    println!("{} {}", prefix, check.message);
    if let Some(fix) = &check.fix {
        println!("       {fix}");
    }
}

/// Check configuration and the external PRP tool
pub fn run(config: &VerifyConfig, config_path: Option<&Path>, format: OutputFormat) -> Result<ExitCode> {
    let mut checks = vec![check_config(config_path)];

    let program = &config.pfgw.program;
    let located = find_program(program);
    checks.push(check_program(program, located.as_deref()));

    // The self-check spawns the tool; skip it when the binary is missing.
    if located.is_some() {
        checks.push(check_self_test(config));
    }

    checks.push(DoctorCheck::new(
        "threshold",
        "ok",
        format!(
            "threshold: numbers of {} bits or more go to {}",
            config.oracle.threshold_bits,
            program.display()
        ),
        None,
    ));

    let all_ok = checks.iter().all(|c| c.status != "fail");

    match format {
        OutputFormat::Json => {
            let envelope = DoctorEnvelope { checks, all_ok };
            println!("{}", format.serialize(&envelope)?);
        }
        OutputFormat::Text => {
            println!("gapverify doctor");
            println!("================");
            println!();

            for check in &checks {
                print_check(check);
            }

            println!();
            if all_ok {
                println!("All checks passed!");
            } else {
                println!("Some checks failed. See above for details.");
            }
        }
    }

    Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn check_config(path: Option<&Path>) -> DoctorCheck {
    match path {
        None => DoctorCheck::new("config", "ok", "config: built-in defaults".to_string(), None),
        Some(path) if path.is_file() => {
            DoctorCheck::new("config", "ok", format!("config: {}", path.display()), None)
        }
        Some(path) => DoctorCheck::new(
            "config",
            "warn",
            format!("config: {} not found, using defaults", path.display()),
            Some("Create the file or unset GAPVERIFY_CONFIG".to_string()),
        ),
    }
}

fn check_program(program: &Path, located: Option<&Path>) -> DoctorCheck {
    let name = program.display();
    match located {
        Some(path) => DoctorCheck::new("pfgw", "ok", format!("{name}: {}", path.display()), None),
        None => DoctorCheck::new(
            "pfgw",
            "warn",
            format!("{name}: not found (needed only for numbers above the threshold)"),
            Some(format!("Install: {PFGW_URL}")),
        ),
    }
}

fn check_self_test(config: &VerifyConfig) -> DoctorCheck {
    let oracle = PrimalityOracle::from_config(config);
    if oracle.check_tool_available() {
        DoctorCheck::new(
            "pfgw self-check",
            "ok",
            "pfgw self-check: probe answers match".to_string(),
            None,
        )
    } else {
        DoctorCheck::new(
            "pfgw self-check",
            "fail",
            "pfgw self-check: probe answers do not match".to_string(),
            Some("Run with RUST_LOG=debug to see the mismatching probe".to_string()),
        )
    }
}

/// Resolve `program` the way a shell would: paths are taken as-is, bare
/// names are looked up on `PATH`.
fn find_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
