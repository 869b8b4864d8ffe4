//! [`Pfgw`], the subprocess-backed [`PrpTool`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::ToolError;
use crate::tool::PrpTool;
use crate::types::ToolOutput;
use crate::verdict::DEFAULT_MARKER;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs `pfgw64` (or a compatible binary) once per query.
///
/// The query is passed as a single `-q<expr>` argument, so compact forms like
/// `503#-659` never have to be expanded into decimal digits. No shell is
/// involved and nothing is quoted.
#[derive(Clone, Debug)]
pub struct Pfgw {
    program: PathBuf,
    marker: String,
    timeout: Option<Duration>,
}

impl Default for Pfgw {
    fn default() -> Self {
        Self::new("pfgw64")
    }
}

impl Pfgw {
    /// Use `program`, looked up on `PATH` when it is a bare name.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            marker: DEFAULT_MARKER.to_owned(),
            timeout: None,
        }
    }

    /// Override the identification marker expected in the output.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Kill invocations that run longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, query: &str, flags: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(flags)
            .arg(format!("-q{query}"))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> ToolError {
        ToolError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl PrpTool for Pfgw {
    fn name(&self) -> &str {
        self.program
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("pfgw")
    }

    fn invoke(&self, query: &str, flags: &[&str]) -> Result<ToolOutput, ToolError> {
        let mut cmd = self.command(query, flags);

        let Some(timeout) = self.timeout else {
            let output = cmd.output().map_err(|e| self.spawn_error(e))?;
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Ok(ToolOutput::new(output.status.code(), text));
        };

        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;
        wait_with_timeout(&mut child, query, timeout)
    }

    fn marker(&self) -> &str {
        &self.marker
    }
}

/// Poll `child` until it exits or `timeout` elapses. Both pipes are drained on
/// helper threads while polling, so a chatty tool never blocks on a full pipe.
fn wait_with_timeout(child: &mut Child, query: &str, timeout: Duration) -> Result<ToolOutput, ToolError> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            let mut text = collect(stdout)?;
            text.push_str(&collect(stderr)?);
            return Ok(ToolOutput::new(status.code(), text));
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ToolError::TimedOut {
                query: query.to_owned(),
                seconds: timeout.as_secs(),
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn drain(mut pipe: impl Read + Send + 'static) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<String, ToolError> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let buf = reader
        .join()
        .map_err(|_| std::io::Error::other("pipe reader panicked"))??;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
