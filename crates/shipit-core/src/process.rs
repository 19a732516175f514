//! External command execution
//!
//! Build, tag and push steps shell out to the toolchain. Output is passed
//! through to the operator's terminal; a non-zero exit is an error.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::config::BuildCommand;
use crate::error::{ProcessError, Result};

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Name used in progress and error messages
    pub label: String,
    /// Program to execute
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command without arguments
    pub fn new(label: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build a command from configuration, expanding the version placeholder
    pub fn from_build(command: &BuildCommand, version: &str) -> Self {
        Self::new(&command.label, &command.program).args(command.expanded_args(version))
    }

    /// Command line as it would be typed
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs external commands
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion; non-zero exit is an error
    fn run(&self, spec: &CommandSpec) -> Result<()>;
}

/// Runs commands as child processes of this one
#[derive(Debug, Clone)]
pub struct SystemRunner {
    cwd: PathBuf,
}

impl SystemRunner {
    /// Create a runner that starts commands in `cwd`
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
        }
    }
}

impl CommandRunner for SystemRunner {
    #[instrument(skip(self, spec), fields(label = %spec.label, command = %spec.command_line()))]
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        let start = Instant::now();
        debug!(cwd = %self.cwd.display(), "spawning command");

        let status = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ProcessError::Spawn {
                command: spec.command_line(),
                source,
            })?;

        if !status.success() {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(ProcessError::Failed {
                label: spec.label.clone(),
                command: spec.command_line(),
                code,
            }
            .into());
        }

        info!(
            label = %spec.label,
            duration_ms = start.elapsed().as_millis(),
            "command finished"
        );
        Ok(())
    }
}
