//! External process execution.
//!
//! Every bundling engine talks to the outside world (the package manager, the
//! container runtime) through a [`ProcessRunner`]. The engines only describe
//! what to run as an [`Invocation`]; the runner decides how.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A single external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name or path. Bare names are looked up on `PATH`.
    pub program: String,
    /// Arguments, passed verbatim.
    pub args: Vec<String>,
    /// Working directory, if not the current one.
    pub cwd: Option<PathBuf>,
    /// Capture stdout/stderr instead of streaming them to the terminal.
    pub capture: bool,
}

impl Invocation {
    /// Start describing a command.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            capture: false,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run inside `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Capture output rather than inheriting the terminal.
    pub fn capture_output(mut self) -> Self {
        self.capture = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Outcome of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout (empty when output was inherited).
    pub stdout: String,
    /// Captured stderr (empty when output was inherited).
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short description of a failed exit, for error messages.
    pub fn failure_summary(&self) -> String {
        let status = self
            .code
            .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{status}: {stderr}")
        }
    }
}

/// Runs external processes on behalf of the bundling engines.
///
/// Calls block until the process exits. There is no timeout; callers that
/// need bounded execution must arrange it outside.
pub trait ProcessRunner: Send + Sync + fmt::Debug {
    /// Run `invocation` to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be found or spawned. A process
    /// that runs and exits non-zero is *not* an error here; inspect
    /// [`ProcessOutput::success`].
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// Runs processes on the host with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let program = which::which(&invocation.program).map_err(|e| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found on PATH: {e}", invocation.program),
            )
        })?;

        let mut cmd = Command::new(program);
        cmd.args(&invocation.args).stdin(Stdio::null());
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        tracing::debug!("Running `{invocation}`");

        if invocation.capture {
            let output = cmd.output()?;
            Ok(ProcessOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = cmd.status()?;
            Ok(ProcessOutput {
                code: status.code(),
                ..ProcessOutput::default()
            })
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("yarn")
            .arg("install")
            .args(["--modules-folder", "nodejs/node_modules"]);
        assert_eq!(inv.to_string(), "yarn install --modules-folder nodejs/node_modules");
        assert!(!inv.capture);
        assert!(inv.cwd.is_none());
    }

    #[test]
    fn test_failure_summary() {
        let out = ProcessOutput {
            code: Some(2),
            stdout: String::new(),
            stderr: "no such image\n".to_string(),
        };
        assert!(!out.success());
        assert_eq!(out.failure_summary(), "exit code 2: no such image");

        let killed = ProcessOutput::default();
        assert_eq!(killed.failure_summary(), "terminated by signal");
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let err = SystemRunner
            .run(&Invocation::new("layerpack-definitely-not-a-real-binary"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_exit_code() {
        let out = SystemRunner
            .run(
                &Invocation::new("sh")
                    .args(["-c", "echo hello; exit 3"])
                    .capture_output(),
            )
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
    }
}
