//! External tool invocation
//!
//! Every codec binary (flac, lame, sox) is reached through [`ToolRunner`] so
//! converters can be exercised without the binaries installed.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::panic::Location;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

/// A fully built command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
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
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Arguments as strings (lossy), mostly for display and assertions
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.arg_strings() {
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '\'') {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands to completion
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `command`, waiting for it to exit.
    ///
    /// A non-zero exit is not an error here; only a failure to start the
    /// process is.
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        log::debug!("Running: {}", command);
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::ToolLaunch {
                program: command.program.clone(),
                source,
            })?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Check the outcome of a tool run, reporting failures with full context.
///
/// Returns true if the tool ran and exited with status 0. The caller's source
/// location is included in the report.
#[track_caller]
pub fn check_status(command: &ToolCommand, outcome: &Result<ToolOutput>) -> bool {
    let caller = Location::caller();
    match outcome {
        Ok(output) if output.success() => true,
        Ok(output) => {
            let code = output
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none (terminated by signal)".to_string());
            log::error!(
                "External command failed ({}:{})\n  Command: {}\n  Return code: {}\n  Stdout:\n{}\n  Stderr:\n{}",
                caller.file(),
                caller.line(),
                command,
                code,
                output.stdout,
                output.stderr
            );
            false
        }
        Err(e) => {
            log::error!(
                "External command could not run ({}:{})\n  Command: {}\n  Error: {}",
                caller.file(),
                caller.line(),
                command,
                e
            );
            false
        }
    }
}

/// Print a command instead of running it
pub fn print_preview(command: &ToolCommand) {
    println!("  {}", command);
}
