//! Structured config derived from an [`EnvSnapshot`].

use std::path::PathBuf;

use super::env_keys::{harness as harness_keys, observability as obv_keys};
use super::loader::{env_bool, env_optional, env_or};
use super::EnvSnapshot;

/// Harness inputs that come from the environment rather than the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Exact `vtk` version to install; `None` installs the latest release.
    pub vtk_version: Option<String>,
    /// Base interpreter used for `-m venv`; `None` searches `PATH`.
    pub base_python: Option<PathBuf>,
    /// Parent of the per-run working directory; `None` uses the system temp dir.
    pub temp_root: Option<PathBuf>,
}

impl HarnessConfig {
    pub fn from_snapshot(env: &EnvSnapshot) -> Self {
        let cfg = Self {
            vtk_version: env_optional(env, harness_keys::VTK_VERSION, &[]),
            base_python: env_optional(env, harness_keys::WHEELCHECK_PYTHON, &[])
                .map(PathBuf::from),
            temp_root: env_optional(env, harness_keys::WHEELCHECK_TMPDIR, &[])
                .map(PathBuf::from),
        };
        tracing::debug!(
            vtk_version = ?cfg.vtk_version,
            base_python = ?cfg.base_python,
            temp_root = ?cfg.temp_root,
            "harness config loaded"
        );
        cfg
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_snapshot(env: &EnvSnapshot) -> Self {
        Self {
            quiet: env_bool(env, obv_keys::WHEELCHECK_QUIET, &[], false),
            log_level: env_or(env, obv_keys::WHEELCHECK_LOG_LEVEL, &[], || {
                "info".to_string()
            }),
            log_json: env_bool(env, obv_keys::WHEELCHECK_LOG_JSON, &[], false),
        }
    }

    /// Process-wide config, read once.
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| Self::from_snapshot(&EnvSnapshot::capture()))
    }
}
