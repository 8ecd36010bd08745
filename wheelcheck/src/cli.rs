use std::path::PathBuf;

use clap::Parser;

/// Verify CPlantBox wheel install and imports.
#[derive(Parser, Debug)]
#[command(name = "wheelcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to wheel (.whl)
    #[arg(value_name = "WHEEL")]
    pub wheel: PathBuf,

    /// Keep the temporary venv after running
    #[arg(long)]
    pub keep_venv: bool,

    /// Base interpreter used to create the venv (default: $WHEELCHECK_PYTHON, then python3/python on PATH)
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// Parent directory for the temporary working directory (default: $WHEELCHECK_TMPDIR, then the system temp dir)
    #[arg(long, value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,
}
