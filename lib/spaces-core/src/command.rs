//! External command execution
//!
//! Every remote operation in this workspace is issued through a CLI. The
//! [`CommandRunner`] trait is the seam to the shell layer so the inventory
//! and orchestrator clients can be driven by a recording fake in tests.

use crate::{Result, SpacesError};
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace, warn};

/// A command to run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Hard deadline; the process is killed when it expires
    pub timeout: Option<Duration>,
    /// Suppress output logging
    pub quiet: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
            quiet: false,
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

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a finished (or killed) command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; `None` when killed by a signal or the deadline
    pub status: Option<i32>,
    /// Combined stdout and stderr
    pub output: String,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            output: output.into(),
            timed_out: false,
        }
    }

    pub fn failure(status: i32, output: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            output: output.into(),
            timed_out: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Return the output, or map the failure onto an error for `spec`
    pub fn into_success(self, spec: &CommandSpec) -> Result<String> {
        if self.timed_out {
            return Err(SpacesError::CommandTimeout(spec.to_string()));
        }
        match self.status {
            Some(0) => Ok(self.output),
            status => Err(SpacesError::RemoteCommand {
                command: spec.to_string(),
                status: status.unwrap_or(-1),
                output: self.output,
            }),
        }
    }
}

/// Runs commands on behalf of the inventory and orchestrator clients
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion. A non-zero exit is reported in the output, not as an error.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        (**self).run(spec).await
    }
}

/// Runs commands as local subprocesses
#[derive(Clone, Debug, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if !spec.quiet {
            debug!("{}", spec);
        }
        trace!(program = %spec.program, args = ?spec.args, "Executing command");

        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpacesError::Spawn {
                command: spec.to_string(),
                source,
            })?;

        let waited = match spec.timeout {
            // Dropping the future on expiry drops the child, which kills it.
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(res) => res,
                Err(_) => {
                    warn!("{} killed after {:?}", spec, limit);
                    return Ok(CommandOutput {
                        status: None,
                        output: String::new(),
                        timed_out: true,
                    });
                }
            },
            None => child.wait_with_output().await,
        };

        let out = waited.map_err(|source| SpacesError::Spawn {
            command: spec.to_string(),
            source,
        })?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));

        if !spec.quiet {
            for line in output.lines() {
                debug!("{}", line);
            }
        }

        Ok(CommandOutput {
            status: out.status.code(),
            output,
            timed_out: false,
        })
    }
}
