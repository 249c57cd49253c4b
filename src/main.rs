//! CLI entry point for the xcurl tool.

use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::debug;
use xcurl_core::error::UNEXPECTED_EXIT_CODE;
use xcurl_core::{Console, Invocation, ReqwestTransport, RunError, report_failure, run};

mod cli;

use cli::ParseFailure;

/// Used when the program name cannot be taken from `argv[0]`.
const DEFAULT_TOOL_NAME: &str = "xcurl";

#[tokio::main]
async fn main() -> ExitCode {
    let argv: Vec<OsString> = std::env::args_os().collect();
    let tool_name = tool_name(argv.first());

    // Parse before tracing so --help output is not preceded by logs
    let args = match cli::parse_args(&argv) {
        Ok(args) => args,
        Err(ParseFailure::Clap(error)) => error.exit(),
        Err(ParseFailure::Abort(abort)) => {
            return fail(&tool_name, &RunError::from(abort), false, false);
        }
    };

    init_tracing(if args.silent { "error" } else { "warn" }, no_color_requested());
    debug!(?args, "CLI arguments parsed");

    let (silent, show_error) = (args.silent, args.show_error);
    let options = match args.into_options() {
        Ok(options) => options,
        Err(abort) => return fail(&tool_name, &RunError::from(abort), silent, show_error),
    };

    match transfer(Invocation::new(tool_name.clone(), options)).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{tool_name}: {error:?}");
            ExitCode::from(UNEXPECTED_EXIT_CODE)
        }
    }
}

async fn transfer(invocation: Invocation) -> Result<ExitCode> {
    let transport = ReqwestTransport::new().context("failed to initialise the HTTP client")?;
    let mut console = Console::stdio();

    match run(&invocation, &transport, &mut console).await {
        Ok(outcome) => {
            debug!(bytes = outcome.bytes_transferred, "exiting successfully");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            let options = &invocation.options;
            let code = report_failure(
                &invocation.tool_name,
                &error,
                options.silent,
                options.show_error,
                &mut console.err,
            );
            Ok(ExitCode::from(code))
        }
    }
}

fn fail(tool_name: &str, error: &RunError, silent: bool, show_error: bool) -> ExitCode {
    let code = report_failure(tool_name, error, silent, show_error, &mut std::io::stderr());
    ExitCode::from(code)
}

/// Program name for error messages: the file stem of `argv[0]`.
fn tool_name(arg0: Option<&OsString>) -> String {
    arg0.and_then(|arg| Path::new(arg).file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string())
}

fn no_color_requested() -> bool {
    let no_color_env = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    let dumb_terminal = std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false);
    no_color_env || dumb_terminal
}

/// Logs go to stderr so they never mix with a response body on stdout.
/// `RUST_LOG` overrides `default_level`.
fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}
