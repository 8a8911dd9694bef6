//! prior CLI - Entry point
//!
//! Usage: prior [--json] <command> [options]

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prior::cli::{Cli, Context};
use prior::PriorError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = Context::from_cli(&cli);
    let Some(command) = cli.command else {
        // No subcommand: show help and succeed.
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    };

    match prior::cli::run(&ctx, command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", error_line(&e));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays clean for `--json` and MCP traffic.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("prior=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn error_line(err: &anyhow::Error) -> String {
    match err.downcast_ref::<PriorError>() {
        Some(e) => match e.hint() {
            Some(hint) => format!("{} (hint: {})", e, hint),
            None => e.to_string(),
        },
        None => format!("{:#}", err),
    }
}
