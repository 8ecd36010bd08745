//! Disposable Python environments for wheel verification.
//!
//! Callers pick the commands; this crate owns how they run. It provides the
//! venv layout, the child-process environment overlay, a runner trait with a
//! process-backed implementation, and a working directory that is removed on
//! every exit path unless explicitly kept.

pub mod builder;
pub mod command;
pub mod error;
pub mod overlay;
pub mod workdir;

pub use builder::{resolve_base_python, VenvLayout};
pub use command::{CommandRunner, ProcessRunner, StepCommand};
pub use error::EnvError;
pub use overlay::{EnvOverlay, LibraryPathRule, OverlayPolicy};
pub use workdir::Workdir;
