//! Environment variable keys.
//!
//! Primary keys use the `WHEELCHECK_*` prefix. Keys owned by the Python side
//! (`VTK_VERSION`, `PYTHONPATH`, loader search paths) keep their native names.

/// Harness inputs
pub mod harness {
    /// Pins the exact `vtk` version installed into the venv.
    pub const VTK_VERSION: &str = "VTK_VERSION";

    /// Base interpreter used to create the venv.
    pub const WHEELCHECK_PYTHON: &str = "WHEELCHECK_PYTHON";

    /// Parent directory of the per-run working directory.
    pub const WHEELCHECK_TMPDIR: &str = "WHEELCHECK_TMPDIR";
}

/// Variables rewritten in the validation overlay
pub mod overlay {
    /// Stripped so the outer interpreter's path cannot leak into the venv.
    pub const PYTHONPATH: &str = "PYTHONPATH";

    /// macOS dynamic loader search path.
    pub const DYLD_LIBRARY_PATH: &str = "DYLD_LIBRARY_PATH";
}

/// Observability and logging
pub mod observability {
    pub const WHEELCHECK_QUIET: &str = "WHEELCHECK_QUIET";
    pub const WHEELCHECK_LOG_LEVEL: &str = "WHEELCHECK_LOG_LEVEL";
    pub const WHEELCHECK_LOG_JSON: &str = "WHEELCHECK_LOG_JSON";
}
