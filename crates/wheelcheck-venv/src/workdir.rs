//! Per-run scratch directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::EnvError;

/// Uniquely named scratch directory owned by one run.
///
/// The keep decision is fixed at creation, so every exit path honours it:
/// [`Workdir::release`] on normal return, `Drop` when unwinding. Removal
/// errors are logged and ignored.
#[derive(Debug)]
pub struct Workdir {
    dir: Option<TempDir>,
    path: PathBuf,
    keep: bool,
}

impl Workdir {
    /// Create `<root>/<prefix>XXXXXX`, or under the system temp dir when `root` is `None`.
    pub fn create(prefix: &str, root: Option<&Path>, keep: bool) -> Result<Self, EnvError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match root {
            Some(r) => builder.tempdir_in(r),
            None => builder.tempdir(),
        }
        .map_err(|source| EnvError::Workdir {
            root: root
                .map(Path::to_path_buf)
                .unwrap_or_else(std::env::temp_dir),
            source,
        })?;
        tracing::debug!(path = %dir.path().display(), keep, "created working directory");
        Ok(Self {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
            keep,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// End of life. A kept tree stays on disk and its path is returned;
    /// otherwise it is removed.
    pub fn release(mut self) -> Option<PathBuf> {
        let dir = self.dir.take()?;
        if self.keep {
            return Some(dir.keep());
        }
        if let Err(e) = dir.close() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove working directory");
        }
        None
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        // Only reached with a live dir when release() was skipped (unwinding).
        if let Some(dir) = self.dir.take() {
            if self.keep {
                let path = dir.keep();
                tracing::warn!(path = %path.display(), "run aborted; keeping working directory");
            }
        }
    }
}
