use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while preparing or driving an isolated environment.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("no base Python interpreter found on PATH (tried {})", tried.join(", "))]
    InterpreterNotFound { tried: Vec<String> },

    #[error("failed to create working directory under {}: {source}", root.display())]
    Workdir {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {}", describe_exit(*code))]
    Failed { program: String, code: Option<i32> },
}

impl EnvError {
    /// Exit code of the failed child, if it exited normally.
    pub fn child_code(&self) -> Option<i32> {
        match self {
            EnvError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}
