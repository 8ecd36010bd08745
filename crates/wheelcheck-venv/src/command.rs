//! Child-process commands and the runner that executes them.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::EnvError;
use crate::overlay::EnvOverlay;

/// One blocking child-process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    program: OsString,
    args: Vec<OsString>,
    overlay: Option<EnvOverlay>,
    cwd: Option<PathBuf>,
}

impl StepCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            overlay: None,
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Replace the child's whole environment with `overlay`.
    pub fn overlay(mut self, overlay: EnvOverlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    pub fn get_overlay(&self) -> Option<&EnvOverlay> {
        self.overlay.as_ref()
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref overlay) = self.overlay {
            cmd.env_clear().envs(overlay.iter());
        }
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

/// Audit-trail rendering: program and arguments joined by single spaces.
impl fmt::Display for StepCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for a in &self.args {
            write!(f, " {}", a.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Executes step commands one at a time.
///
/// A run stops at the first `Err`; implementations must not retry.
pub trait CommandRunner {
    fn run(&mut self, cmd: &StepCommand) -> Result<(), EnvError>;
}

/// Runs commands as real child processes with inherited stdio.
///
/// Each command line is echoed to stdout as `> <command>` before it starts.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, cmd: &StepCommand) -> Result<(), EnvError> {
        println!("> {cmd}");
        // Child output shares the terminal; keep the echo ahead of it.
        let _ = io::stdout().flush();

        let program = cmd.program.to_string_lossy().into_owned();
        tracing::debug!(program = %program, cwd = ?cmd.cwd, "spawning child");
        let status = cmd
            .to_command()
            .status()
            .map_err(|source| EnvError::Spawn {
                program: program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(EnvError::Failed {
                program,
                code: status.code(),
            })
        }
    }
}
