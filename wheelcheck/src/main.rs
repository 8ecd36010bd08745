use std::process::ExitCode;

use clap::Parser;
use wheelcheck::cli::Cli;
use wheelcheck::verify::{self, VerifyError, VerifyOptions};
use wheelcheck_core::config::{EnvSnapshot, HarnessConfig};
use wheelcheck_core::observability;
use wheelcheck_venv::ProcessRunner;

fn main() -> ExitCode {
    observability::init_tracing();
    let cli = Cli::parse();

    let env = EnvSnapshot::capture();
    let opts = VerifyOptions::resolve(&cli, &HarnessConfig::from_snapshot(&env));

    match verify::verify(&opts, &env, &mut ProcessRunner) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e @ VerifyError::WheelNotFound(_)) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
