//! Bounded external command execution
//!
//! Every command an adapter runs carries its own timeout. A timeout is
//! reported as [`Error::Timeout`], a non-zero exit is returned as a normal
//! [`CommandOutput`] so callers can account for partial success, and only
//! [`CommandOutput::into_success`] turns it into [`Error::CommandFailed`].
//! A program missing from `PATH` is [`Error::Unavailable`].

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::ComponentKind;

/// One command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Run through `sudo` when `elevate` is set
    pub fn elevated(self, elevate: bool) -> Self {
        if !elevate {
            return self;
        }
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: "sudo".to_string(),
            args,
            stdin: self.stdin,
            timeout: self.timeout,
        }
    }

    /// `program arg1 arg2` for logs and test lookups
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Non-empty trimmed stdout lines
    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Convert a non-zero exit into [`Error::CommandFailed`]
    pub fn into_success(self, spec: &CommandSpec) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::CommandFailed {
                program: spec.command_line(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs external commands for component adapters
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion or timeout
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Run a read-only query and return its stdout lines, failing on non-zero exit
    async fn query_lines(&self, spec: &CommandSpec) -> Result<Vec<String>> {
        let output = self.run(spec).await?.into_success(spec)?;
        Ok(output.lines())
    }
}

/// [`CommandRunner`] backed by real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Running: {}", spec.command_line());

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        // The runner does not know which component asked, so the program names the kind
        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::unavailable(
                    ComponentKind::Custom(spec.program.clone()),
                    "not found on PATH",
                )
            } else {
                Error::Io(e)
            }
        })?;

        let stdin_payload = spec.stdin.clone();
        let stdin_pipe = child.stdin.take();
        let result = tokio::time::timeout(spec.timeout, async move {
            if let (Some(mut pipe), Some(payload)) = (stdin_pipe, stdin_payload) {
                pipe.write_all(payload.as_bytes()).await?;
                pipe.shutdown().await?;
            }
            child.wait_with_output().await
        })
        .await;

        match result {
            Ok(Ok(output)) => {
                let output = CommandOutput {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                if !output.success() {
                    warn!(
                        "Command failed: {} (exit {:?}): {}",
                        spec.command_line(),
                        output.code,
                        output.stderr.trim()
                    );
                }
                Ok(output)
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => {
                warn!(
                    "Command timed out after {}s: {}",
                    spec.timeout.as_secs(),
                    spec.command_line()
                );
                Err(Error::Timeout {
                    program: spec.program.clone(),
                    timeout: spec.timeout,
                })
            }
        }
    }
}
