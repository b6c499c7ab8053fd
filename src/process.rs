use std::ffi::{OsStr, OsString};
use std::fmt::{self, Display};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{program} not found")]
    NotFound { program: String },
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("{program} exited with {}", describe_status(.status))]
    Failed {
        program: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl Error {
    /// Captured error stream of a process that ran and failed.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

/// One external command, built up front so it can be logged and inspected before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;

        for arg in &self.args {
            let arg = arg.to_string_lossy();

            if arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Output {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }
}

pub trait Runner {
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<Output, Error>>;
}

/// Spawns the real binary and waits for it to exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<Output, Error> {
        let output = Command::new(invocation.program())
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| {
                let program = invocation.program_name();

                match source.kind() {
                    io::ErrorKind::NotFound => Error::NotFound { program },
                    _ => Error::Spawn { program, source },
                }
            })?;

        Ok(Output {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs `invocation` to completion. Anything but a zero exit status is an error.
pub async fn execute<R: Runner>(runner: &R, invocation: &Invocation) -> Result<Output, Error> {
    debug!(command = %invocation, "running external command");

    let output = runner.run(invocation).await?;

    if output.success() {
        info!(program = %invocation.program().display(), "external command succeeded");
        return Ok(output);
    }

    warn!(
        program = %invocation.program().display(),
        status = ?output.status,
        stderr = %output.stderr.trim_end(),
        "external command failed"
    );

    Err(Error::Failed {
        program: invocation.program_name(),
        status: output.status,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::{Error, Invocation, Output, Runner};

    /// Records every invocation and answers with a fixed exit status.
    pub(crate) struct RecordingRunner {
        status: Option<i32>,
        stderr: String,
        missing: bool,
        calls: RefCell<Vec<Invocation>>,
    }

    impl RecordingRunner {
        pub(crate) fn exiting_with(status: i32) -> Self {
            Self { status: Some(status), stderr: String::new(), missing: false, calls: RefCell::new(Vec::new()) }
        }

        pub(crate) fn failing(status: i32, stderr: &str) -> Self {
            Self { stderr: stderr.to_string(), ..Self::exiting_with(status) }
        }

        pub(crate) fn missing_binary() -> Self {
            Self { missing: true, ..Self::exiting_with(0) }
        }

        pub(crate) fn calls(&self) -> Vec<Invocation> {
            self.calls.borrow().clone()
        }
    }

    impl Runner for RecordingRunner {
        async fn run(&self, invocation: &Invocation) -> Result<Output, Error> {
            self.calls.borrow_mut().push(invocation.clone());

            if self.missing {
                return Err(Error::NotFound { program: invocation.program_name() });
            }

            Ok(Output { status: self.status, stdout: String::new(), stderr: self.stderr.clone() })
        }
    }

    pub(crate) fn args_of(invocation: &Invocation) -> Vec<String> {
        invocation.arguments().iter().map(|arg| arg.to_string_lossy().into_owned()).collect()
    }
}

#[cfg(test)]
mod test {
    use super::testing::RecordingRunner;
    use super::*;

    #[test]
    fn invocation_display_quotes_whitespace() {
        let invocation = Invocation::new("ia").args(["upload", "--metadata=title:Nothing OS"]);

        assert_eq!(invocation.to_string(), "ia upload '--metadata=title:Nothing OS'");
    }

    #[tokio::test]
    async fn execute_passes_zero_exit() {
        let runner = RecordingRunner::exiting_with(0);
        let invocation = Invocation::new("true");

        assert!(execute(&runner, &invocation).await.is_ok());
        assert_eq!(runner.calls(), vec![invocation]);
    }

    #[tokio::test]
    async fn execute_surfaces_stderr_on_failure() {
        let runner = RecordingRunner::failing(2, "quota exceeded\n");

        let err = execute(&runner, &Invocation::new("ia")).await.unwrap_err();

        assert_eq!(err.stderr(), Some("quota exceeded\n"));
        assert_eq!(err.to_string(), "ia exited with exit status 2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_captures_streams_and_status() {
        let invocation = Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);

        let output = SystemRunner.run(&invocation).await.unwrap();

        assert_eq!(output.status, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn system_runner_reports_missing_binary() {
        let invocation = Invocation::new("definitely-not-a-real-binary-4f1c");

        let err = SystemRunner.run(&invocation).await.unwrap_err();

        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.stderr(), None);
    }
}
