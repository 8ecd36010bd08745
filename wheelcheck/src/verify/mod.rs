//! Wheel verification harness.
//!
//! # Pipeline
//!
//! ```text
//! check wheel → digest → resolve base python → create workdir
//!   → venv → upgrade pip → install wheel → install vtk → scipy → mpi4py
//!   → validation program (overlay env, cwd = workdir)
//!   → release workdir (always; kept with --keep-venv)
//! ```
//!
//! The first failing child aborts the rest of the sequence. The working
//! directory is released on every path out of [`verify`].

pub mod digest;
pub mod validation;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use wheelcheck_core::config::{EnvSnapshot, HarnessConfig};
use wheelcheck_venv::{
    resolve_base_python, CommandRunner, EnvError, EnvOverlay, OverlayPolicy, StepCommand,
    VenvLayout, Workdir,
};

use crate::cli::Cli;

/// Prefix of the per-run working directory.
pub const WORKDIR_PREFIX: &str = "cpb-verify-";

/// Name of the venv directory inside the working directory.
pub const VENV_DIR_NAME: &str = "venv";

/// Exit status for a missing or unreadable wheel.
pub const EXIT_USAGE: u8 = 2;

/// Exit status for failures that carry no child status of their own.
pub const EXIT_FAILURE: u8 = 1;

/// One stage of the install-and-validate sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateVenv,
    UpgradePip,
    InstallWheel,
    InstallVisDependency,
    InstallExtraDependency(&'static str),
    Validate,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CreateVenv => write!(f, "create venv"),
            Step::UpgradePip => write!(f, "upgrade pip"),
            Step::InstallWheel => write!(f, "install wheel"),
            Step::InstallVisDependency => write!(f, "install {}", validation::VIS_DEPENDENCY),
            Step::InstallExtraDependency(name) => write!(f, "install {name}"),
            Step::Validate => write!(f, "validation program"),
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Wheel not found: {}", .0.display())]
    WheelNotFound(PathBuf),

    #[error("failed to read wheel {}: {source}", path.display())]
    WheelUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: EnvError,
    },

    #[error(transparent)]
    Env(#[from] EnvError),
}

impl VerifyError {
    /// Process exit status for this failure.
    ///
    /// A failing step propagates its child's status when it fits in a
    /// process exit code.
    pub fn exit_code(&self) -> u8 {
        match self {
            VerifyError::WheelNotFound(_) | VerifyError::WheelUnreadable { .. } => EXIT_USAGE,
            VerifyError::Step { source, .. } => source
                .child_code()
                .and_then(|c| u8::try_from(c).ok())
                .filter(|c| *c != 0)
                .unwrap_or(EXIT_FAILURE),
            VerifyError::Env(_) => EXIT_FAILURE,
        }
    }

    pub fn failed_step(&self) -> Option<Step> {
        match self {
            VerifyError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Inputs of one verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    pub wheel: PathBuf,
    pub keep_venv: bool,
    pub base_python: Option<PathBuf>,
    pub temp_root: Option<PathBuf>,
    pub vtk_version: Option<String>,
}

impl VerifyOptions {
    /// Merge command-line flags over environment config; flags win.
    pub fn resolve(cli: &Cli, cfg: &HarnessConfig) -> Self {
        Self {
            wheel: cli.wheel.clone(),
            keep_venv: cli.keep_venv,
            base_python: cli.python.clone().or_else(|| cfg.base_python.clone()),
            temp_root: cli.tmp_dir.clone().or_else(|| cfg.temp_root.clone()),
            vtk_version: cfg.vtk_version.clone(),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub wheel: PathBuf,
    pub wheel_sha256: String,
    /// Venv left on disk because of `keep_venv`.
    pub kept_venv: Option<PathBuf>,
}

/// Command sequence for one run, in execution order.
pub fn plan(
    layout: &VenvLayout,
    base_python: &Path,
    wheel: &Path,
    vtk_version: Option<&str>,
    workdir: &Path,
    overlay: EnvOverlay,
) -> Vec<(Step, StepCommand)> {
    let mut steps = vec![
        (Step::CreateVenv, layout.create_command(base_python)),
        (Step::UpgradePip, layout.upgrade_pip()),
        (Step::InstallWheel, layout.pip_install([wheel.as_os_str()])),
        (
            Step::InstallVisDependency,
            layout.pip_install([validation::vis_requirement(vtk_version)]),
        ),
    ];
    for &dep in validation::EXTRA_DEPENDENCIES {
        steps.push((Step::InstallExtraDependency(dep), layout.pip_install([dep])));
    }
    steps.push((
        Step::Validate,
        layout
            .run_inline(validation::VALIDATION_PROGRAM)
            .overlay(overlay)
            .current_dir(workdir),
    ));
    steps
}

fn run_plan<R: CommandRunner>(
    steps: &[(Step, StepCommand)],
    runner: &mut R,
) -> Result<(), VerifyError> {
    for (step, cmd) in steps {
        tracing::info!(step = %step, "running step");
        runner
            .run(cmd)
            .map_err(|source| VerifyError::Step { step: *step, source })?;
    }
    Ok(())
}

/// Verify one wheel end to end.
///
/// `env` is the snapshot the validation overlay is derived from; nothing in
/// the process environment is modified.
pub fn verify<R: CommandRunner>(
    opts: &VerifyOptions,
    env: &EnvSnapshot,
    runner: &mut R,
) -> Result<VerifyReport, VerifyError> {
    let wheel = std::path::absolute(&opts.wheel).unwrap_or_else(|_| opts.wheel.clone());
    if !wheel.is_file() {
        return Err(VerifyError::WheelNotFound(wheel));
    }
    let wheel_sha256 = digest::sha256_file(&wheel).map_err(|source| VerifyError::WheelUnreadable {
        path: wheel.clone(),
        source,
    })?;
    tracing::info!(wheel = %wheel.display(), sha256 = %wheel_sha256, "verifying wheel");

    let base_python = resolve_base_python(opts.base_python.as_deref())?;
    tracing::debug!(python = %base_python.display(), "base interpreter");

    let workdir = Workdir::create(WORKDIR_PREFIX, opts.temp_root.as_deref(), opts.keep_venv)?;
    let layout = VenvLayout::new(workdir.path().join(VENV_DIR_NAME));
    let overlay = EnvOverlay::derive(env, &OverlayPolicy::for_host());
    let steps = plan(
        &layout,
        &base_python,
        &wheel,
        opts.vtk_version.as_deref(),
        workdir.path(),
        overlay,
    );

    let outcome = run_plan(&steps, runner);

    let kept_venv = workdir.release().map(|_| layout.root.clone());
    if let Some(ref venv) = kept_venv {
        println!("Keeping venv at: {}", venv.display());
    }

    match outcome {
        Ok(()) => {
            tracing::info!(wheel = %wheel.display(), "wheel verified");
            Ok(VerifyReport {
                wheel,
                wheel_sha256,
                kept_venv,
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, "verification aborted");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    /// Records every command; optionally fails the n-th one with a status.
    #[derive(Default)]
    struct RecordingRunner {
        seen: Vec<StepCommand>,
        fail_at: Option<(usize, i32)>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, cmd: &StepCommand) -> Result<(), EnvError> {
            let idx = self.seen.len();
            self.seen.push(cmd.clone());
            match self.fail_at {
                Some((n, code)) if n == idx => Err(EnvError::Failed {
                    program: cmd.program().to_string_lossy().into_owned(),
                    code: Some(code),
                }),
                _ => Ok(()),
            }
        }
    }

    struct Fixture {
        _wheel_dir: tempfile::TempDir,
        root: tempfile::TempDir,
        opts: VerifyOptions,
    }

    fn fixture() -> Fixture {
        let wheel_dir = tempfile::tempdir().unwrap();
        let wheel = wheel_dir.path().join("pkg-1.0-py3-none-any.whl");
        std::fs::write(&wheel, b"PK\x03\x04").unwrap();
        let root = tempfile::tempdir().unwrap();
        // The test binary itself is a guaranteed-existing executable.
        let base_python = std::env::current_exe().unwrap();
        let opts = VerifyOptions {
            wheel,
            keep_venv: false,
            base_python: Some(base_python),
            temp_root: Some(root.path().to_path_buf()),
            vtk_version: None,
        };
        Fixture {
            _wheel_dir: wheel_dir,
            root,
            opts,
        }
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    fn env_with_pythonpath() -> EnvSnapshot {
        [("PYTHONPATH", "/outer/site-packages"), ("HOME", "/home/u")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_success_runs_all_steps_and_cleans_up() {
        let fx = fixture();
        let mut runner = RecordingRunner::default();
        let report = verify(&fx.opts, &env_with_pythonpath(), &mut runner).unwrap();

        assert_eq!(runner.seen.len(), 7);
        assert_eq!(report.kept_venv, None);
        assert_eq!(report.wheel, fx.opts.wheel);
        assert_eq!(report.wheel_sha256.len(), 64);
        assert_eq!(entries(fx.root.path()), 0);

        let installs: Vec<String> = runner.seen[1..6]
            .iter()
            .map(|c| c.args_lossy().last().cloned().unwrap_or_default())
            .collect();
        assert_eq!(
            installs,
            [
                "pip".to_string(),
                fx.opts.wheel.display().to_string(),
                "vtk".to_string(),
                "scipy".to_string(),
                "mpi4py".to_string(),
            ]
        );
    }

    #[test]
    fn test_keep_venv_leaves_directory_and_reports_path() {
        let mut fx = fixture();
        fx.opts.keep_venv = true;
        let mut runner = RecordingRunner::default();
        let report = verify(&fx.opts, &EnvSnapshot::default(), &mut runner).unwrap();

        let venv = report.kept_venv.expect("venv kept");
        assert!(venv.ends_with(VENV_DIR_NAME));
        let workdir = venv.parent().unwrap();
        assert!(workdir.is_dir());
        assert!(workdir.starts_with(fx.root.path()));
        assert_eq!(entries(fx.root.path()), 1);
    }

    #[test]
    fn test_first_failure_halts_and_still_cleans_up() {
        let fx = fixture();
        let mut runner = RecordingRunner {
            fail_at: Some((2, 42)),
            ..Default::default()
        };
        let err = verify(&fx.opts, &EnvSnapshot::default(), &mut runner).unwrap_err();

        assert_eq!(runner.seen.len(), 3);
        assert_eq!(err.failed_step(), Some(Step::InstallWheel));
        assert_eq!(err.exit_code(), 42);
        assert_eq!(entries(fx.root.path()), 0);
    }

    #[test]
    fn test_failure_at_every_step_cleans_up() {
        for n in 0..7 {
            let fx = fixture();
            let mut runner = RecordingRunner {
                fail_at: Some((n, 1)),
                ..Default::default()
            };
            assert!(verify(&fx.opts, &EnvSnapshot::default(), &mut runner).is_err());
            assert_eq!(runner.seen.len(), n + 1);
            assert_eq!(entries(fx.root.path()), 0, "step {n} left a directory behind");
        }
    }

    #[test]
    fn test_failure_with_keep_venv_keeps_directory() {
        let mut fx = fixture();
        fx.opts.keep_venv = true;
        let mut runner = RecordingRunner {
            fail_at: Some((4, 1)),
            ..Default::default()
        };
        let err = verify(&fx.opts, &EnvSnapshot::default(), &mut runner).unwrap_err();
        assert_eq!(err.failed_step(), Some(Step::InstallExtraDependency("scipy")));
        assert_eq!(entries(fx.root.path()), 1);
    }

    struct PanickingRunner;

    impl CommandRunner for PanickingRunner {
        fn run(&mut self, _cmd: &StepCommand) -> Result<(), EnvError> {
            panic!("runner blew up");
        }
    }

    #[test]
    fn test_panic_mid_run_keeps_venv_when_asked() {
        let mut fx = fixture();
        fx.opts.keep_venv = true;
        let opts = fx.opts.clone();
        let result = std::panic::catch_unwind(move || {
            verify(&opts, &EnvSnapshot::default(), &mut PanickingRunner)
        });
        assert!(result.is_err());
        assert_eq!(entries(fx.root.path()), 1);
    }

    #[test]
    fn test_panic_mid_run_removes_workdir() {
        let fx = fixture();
        let opts = fx.opts.clone();
        let result = std::panic::catch_unwind(move || {
            verify(&opts, &EnvSnapshot::default(), &mut PanickingRunner)
        });
        assert!(result.is_err());
        assert_eq!(entries(fx.root.path()), 0);
    }

    #[test]
    fn test_missing_wheel_exits_2_without_side_effects() {
        let fx = fixture();
        let mut opts = fx.opts.clone();
        opts.wheel = fx.root.path().join("nonexistent.whl");
        let mut runner = RecordingRunner::default();

        let err = verify(&opts, &EnvSnapshot::default(), &mut runner).unwrap_err();
        assert!(matches!(err, VerifyError::WheelNotFound(_)));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("nonexistent.whl"));
        assert!(err.to_string().starts_with("Wheel not found: "));
        assert!(runner.seen.is_empty());
        assert_eq!(entries(fx.root.path()), 0);
    }

    #[test]
    fn test_directory_is_not_a_wheel() {
        let fx = fixture();
        let mut opts = fx.opts.clone();
        opts.wheel = fx.root.path().to_path_buf();
        let err = verify(&opts, &EnvSnapshot::default(), &mut RecordingRunner::default())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_pinned_vtk_version() {
        let mut fx = fixture();
        fx.opts.vtk_version = Some("9.2.0".into());
        let mut runner = RecordingRunner::default();
        verify(&fx.opts, &EnvSnapshot::default(), &mut runner).unwrap();

        let vtk = &runner.seen[3];
        assert_eq!(vtk.args_lossy(), ["-m", "pip", "-q", "install", "vtk==9.2.0"]);
    }

    #[test]
    fn test_validation_step_uses_overlay_and_workdir() {
        let fx = fixture();
        let mut runner = RecordingRunner::default();
        verify(&fx.opts, &env_with_pythonpath(), &mut runner).unwrap();

        let validate = runner.seen.last().unwrap();
        assert_eq!(validate.get_args()[0].as_os_str(), OsStr::new("-c"));
        let overlay = validate.get_overlay().expect("overlay set");
        assert!(!overlay.contains("PYTHONPATH"));
        assert_eq!(overlay.get("HOME"), Some(OsStr::new("/home/u")));

        let cwd = validate.get_current_dir().unwrap();
        assert!(cwd.starts_with(fx.root.path()));
        assert!(cwd
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(WORKDIR_PREFIX));

        // Install steps inherit the ambient environment.
        assert!(runner.seen[..6].iter().all(|c| c.get_overlay().is_none()));
    }

    #[test]
    fn test_venv_created_inside_workdir_with_base_python() {
        let fx = fixture();
        let mut runner = RecordingRunner::default();
        verify(&fx.opts, &EnvSnapshot::default(), &mut runner).unwrap();

        let create = &runner.seen[0];
        let base = fx.opts.base_python.as_ref().unwrap();
        assert_eq!(
            std::fs::canonicalize(create.program()).unwrap(),
            std::fs::canonicalize(base).unwrap()
        );
        let venv = PathBuf::from(create.get_args()[2].clone());
        assert!(venv.ends_with(VENV_DIR_NAME));
        assert!(venv.starts_with(fx.root.path()));

        let venv_python = VenvLayout::new(&venv).python;
        assert!(runner.seen[1..]
            .iter()
            .all(|c| c.program() == venv_python.as_os_str()));
    }

    #[test]
    fn test_missing_interpreter_creates_nothing() {
        let mut fx = fixture();
        fx.opts.base_python = Some(PathBuf::from("wheelcheck-no-such-python-xyz"));
        let mut runner = RecordingRunner::default();
        let err = verify(&fx.opts, &EnvSnapshot::default(), &mut runner).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(runner.seen.is_empty());
        assert_eq!(entries(fx.root.path()), 0);
    }

    #[test]
    fn test_relative_wheel_path_is_made_absolute() {
        let fx = fixture();
        let cwd = std::env::current_dir().unwrap();
        let mut opts = fx.opts.clone();
        opts.wheel = PathBuf::from("definitely-missing-relative.whl");
        let err = verify(&opts, &EnvSnapshot::default(), &mut RecordingRunner::default())
            .unwrap_err();
        match err {
            VerifyError::WheelNotFound(p) => {
                assert!(p.is_absolute());
                assert_eq!(p, cwd.join("definitely-missing-relative.whl"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_signal_or_oversized_status_maps_to_1() {
        let signalled = VerifyError::Step {
            step: Step::Validate,
            source: EnvError::Failed {
                program: "python".into(),
                code: None,
            },
        };
        assert_eq!(signalled.exit_code(), 1);

        let oversized = VerifyError::Step {
            step: Step::Validate,
            source: EnvError::Failed {
                program: "python".into(),
                code: Some(3221225477u32 as i32),
            },
        };
        assert_eq!(oversized.exit_code(), 1);
    }

    #[test]
    fn test_options_flags_override_env() {
        let cli = Cli {
            wheel: PathBuf::from("a.whl"),
            keep_venv: true,
            python: Some(PathBuf::from("/opt/py/bin/python3")),
            tmp_dir: None,
        };
        let cfg = HarnessConfig {
            vtk_version: Some("9.3.1".into()),
            base_python: Some(PathBuf::from("/usr/bin/python3")),
            temp_root: Some(PathBuf::from("/scratch")),
        };
        let opts = VerifyOptions::resolve(&cli, &cfg);
        assert_eq!(opts.base_python, Some(PathBuf::from("/opt/py/bin/python3")));
        assert_eq!(opts.temp_root, Some(PathBuf::from("/scratch")));
        assert_eq!(opts.vtk_version.as_deref(), Some("9.3.1"));
        assert!(opts.keep_venv);
    }
}
