//! Child environment overlay for the validation step.
//!
//! The overlay is derived from an [`EnvSnapshot`]: variables named by the
//! policy are stripped, and a loader search-path variable can be prepended
//! with the first candidate library directory that exists. The process
//! environment itself is never modified.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use wheelcheck_core::config::env_keys::overlay as overlay_keys;
use wheelcheck_core::config::EnvSnapshot;

#[cfg(windows)]
const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: &str = ":";

/// Homebrew Open MPI library directories (Apple Silicon first, then Intel).
#[cfg(target_os = "macos")]
const OPEN_MPI_LIB_DIRS: &[&str] = &["/opt/homebrew/opt/open-mpi/lib", "/usr/local/opt/open-mpi/lib"];

/// Prepend the first existing candidate directory to a search-path variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPathRule {
    pub var: String,
    pub candidates: Vec<PathBuf>,
}

impl LibraryPathRule {
    fn first_existing(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.is_dir())
    }
}

/// What to change when deriving an overlay from a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayPolicy {
    pub strip: Vec<String>,
    pub library_path: Option<LibraryPathRule>,
}

impl OverlayPolicy {
    /// Policy for the validation child on this platform: drop `PYTHONPATH`,
    /// and on macOS make Homebrew's Open MPI visible to `mpi4py`.
    pub fn for_host() -> Self {
        Self {
            strip: vec![overlay_keys::PYTHONPATH.to_string()],
            library_path: host_library_rule(),
        }
    }
}

#[cfg(target_os = "macos")]
fn host_library_rule() -> Option<LibraryPathRule> {
    Some(LibraryPathRule {
        var: overlay_keys::DYLD_LIBRARY_PATH.to_string(),
        candidates: OPEN_MPI_LIB_DIRS.iter().map(PathBuf::from).collect(),
    })
}

#[cfg(not(target_os = "macos"))]
fn host_library_rule() -> Option<LibraryPathRule> {
    None
}

/// Complete environment handed to a child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<OsString, OsString>,
}

impl EnvOverlay {
    pub fn derive(snapshot: &EnvSnapshot, policy: &OverlayPolicy) -> Self {
        let mut vars = snapshot.clone().into_inner();
        for key in &policy.strip {
            vars.remove(OsStr::new(key));
        }

        if let Some(rule) = &policy.library_path {
            if let Some(dir) = rule.first_existing() {
                let key = OsString::from(&rule.var);
                let value = match vars.get(&key).filter(|v| !v.is_empty()) {
                    Some(existing) => {
                        let mut v = dir.as_os_str().to_os_string();
                        v.push(PATH_LIST_SEPARATOR);
                        v.push(existing);
                        v
                    }
                    None => dir.as_os_str().to_os_string(),
                };
                tracing::debug!(var = %rule.var, dir = %dir.display(), "prepending library dir");
                vars.insert(key, value);
            }
        }

        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(OsStr::new(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for EnvOverlay
where
    K: Into<OsString>,
    V: Into<OsString>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
