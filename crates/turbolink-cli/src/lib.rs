//! Command-line runtime for driving a turbolink connection.
//!
//! The binary plays the part of a polling host: it opens a [`turbolink::Link`],
//! steps it on a fixed tick and prints what arrives. Configuration loading and
//! the IO streams can be substituted so the runtime is testable without a
//! process boundary.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;
use turbolink::Link;
use turbolink_config::Config;

mod cli;
mod commands;
mod config;
mod errors;
mod telemetry;
mod ticker;

use cli::Cli;
use config::{ConfigArgumentSplit, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;

pub(crate) const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cli");

/// CLI flags recognised by the configuration loader.
///
/// Keep in sync with the fields of `turbolink_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--address",
    "--log-filter",
    "--log-format",
    "--close-event",
    "--tick-interval-ms",
    "--connect-timeout-ms",
    "--close-code",
    "--close-reason",
];

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader, Link::from_config)
}

/// Runs the CLI with a substitutable loader and link factory.
pub(crate) fn run_with_loader<I, W, E, L, F>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
    make_link: F,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
    F: FnOnce(&Config) -> Link,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli_arguments = prepare_cli_arguments(&args, &split);

    let cli = match Cli::try_parse_from(cli_arguments) {
        Ok(cli) => cli,
        Err(error) if !error.use_stderr() => {
            if let Err(write_error) = write!(io.stdout, "{error}") {
                warn!(target: CLI_TARGET, error = %write_error, "failed to print help");
            }
            return ExitCode::SUCCESS;
        }
        Err(error) => return report(io, &AppError::CliUsage(error)),
    };

    let result = loader.load(&split.config_arguments).and_then(|config| {
        telemetry::initialise(&config)?;
        let link = make_link(&config);
        commands::execute(cli.command, &config, &link, &mut *io.stdout)
    });

    match result {
        Ok(exit_code) => exit_code,
        Err(error) => report(io, &error),
    }
}

fn report<W: Write, E: Write>(io: &mut IoStreams<'_, W, E>, error: &AppError) -> ExitCode {
    if let Err(write_error) = writeln!(io.stderr, "{error}") {
        warn!(target: CLI_TARGET, error = %write_error, "failed to report error");
    }
    ExitCode::FAILURE
}

/// Rebuilds the argument list clap sees: the program name followed by the
/// tokens after the configuration flags.
fn prepare_cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    let program = args
        .first()
        .cloned()
        .unwrap_or_else(|| OsString::from("turbolink"));
    let command = args.get(split.command_start..).unwrap_or_default();
    std::iter::once(program)
        .chain(command.iter().cloned())
        .collect()
}
