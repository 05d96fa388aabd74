//! CLI entrypoint for the turbolink operator tool.
//!
//! The binary delegates to [`turbolink_cli::run`], which loads configuration,
//! parses the subcommand and drives a link from a fixed-rate tick loop.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked: the tracing subscriber writes to stderr from transport threads
    // while the tick loop runs.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    turbolink_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
