//! Build an isolated Python venv and resolve the interpreters around it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::command::StepCommand;
use crate::error::EnvError;

/// Interpreter names searched for on `PATH` when no base interpreter is configured.
const BASE_PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

/// Paths inside a venv directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvLayout {
    pub root: PathBuf,
    pub python: PathBuf,
}

impl VenvLayout {
    /// Layout for a venv rooted at `root`. The directory does not need to exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let python = venv_python(&root);
        Self { root, python }
    }

    /// `<base> -m venv <root>`
    pub fn create_command(&self, base_python: &Path) -> StepCommand {
        StepCommand::new(base_python)
            .arg("-m")
            .arg("venv")
            .arg(&self.root)
    }

    /// `<venv-python> -m pip -q install <specs...>`
    pub fn pip_install<I, S>(&self, specs: I) -> StepCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        StepCommand::new(&self.python)
            .args(["-m", "pip", "-q", "install"])
            .args(specs)
    }

    /// `<venv-python> -m pip -q install -U pip`
    pub fn upgrade_pip(&self) -> StepCommand {
        self.pip_install(["-U", "pip"])
    }

    /// `<venv-python> -c <code>`
    pub fn run_inline(&self, code: &str) -> StepCommand {
        StepCommand::new(&self.python).arg("-c").arg(code)
    }
}

/// Interpreter path inside a venv for the host platform.
fn venv_python(root: &Path) -> PathBuf {
    if cfg!(windows) {
        root.join("Scripts").join("python.exe")
    } else {
        root.join("bin").join("python")
    }
}

/// Resolve the interpreter that creates the venv.
///
/// An explicit override is resolved through `PATH` when it is a bare name and
/// used as-is when it is a path. Without one, the first of `python3` and
/// `python` found on `PATH` wins.
pub fn resolve_base_python(override_python: Option<&Path>) -> Result<PathBuf, EnvError> {
    if let Some(p) = override_python {
        return which::which(p).map_err(|_| EnvError::InterpreterNotFound {
            tried: vec![p.display().to_string()],
        });
    }
    BASE_PYTHON_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| EnvError::InterpreterNotFound {
            tried: BASE_PYTHON_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        })
}
