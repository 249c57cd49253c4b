//! One transfer invocation, from parsed options to a delivered body.
//!
//! [`run`] is the library entry point: it validates the URL, builds the
//! request, hands it to a [`Transport`], and delivers the response to
//! standard output or a file. Everything the process would print goes
//! through a [`Console`], so the whole flow runs against in-memory writers in
//! tests.

use std::error::Error as StdError;
use std::io::{IsTerminal, Write};
use std::time::Instant;

use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use crate::error::{AbortError, RunError};
use crate::options::TransferOptions;
use crate::output::{
    Destination, TransferOutcome, format_request_echo, format_response_echo,
    resolve_output_file_name, stream_body,
};
use crate::request::build_request;
use crate::target::parse_url;
use crate::transport::{ResponseHandle, Transport};

/// A single run of the tool.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Name used to prefix error messages (the program's own name).
    pub tool_name: String,
    pub options: TransferOptions,
}

impl Invocation {
    #[must_use]
    pub fn new(tool_name: impl Into<String>, options: TransferOptions) -> Self {
        Self {
            tool_name: tool_name.into(),
            options,
        }
    }
}

/// Output streams of an invocation.
pub struct Console<O, E> {
    /// Response body destination when no file is selected.
    pub out: O,
    /// Echo, report and error messages.
    pub err: E,
    /// Whether `out` is an interactive terminal.
    pub out_is_terminal: bool,
}

impl Console<tokio::io::Stdout, std::io::Stderr> {
    /// The process's standard output and standard error.
    #[must_use]
    pub fn stdio() -> Self {
        Self {
            out: tokio::io::stdout(),
            err: std::io::stderr(),
            out_is_terminal: std::io::stdout().is_terminal(),
        }
    }
}

/// Performs the transfer described by `invocation`.
///
/// # Errors
///
/// Returns [`RunError::Abort`] for the user-facing conditions (bad URL,
/// unreadable body file, unresolvable host, uncreatable output file, HTTP
/// error under `--fail`) and the other [`RunError`] variants for unexpected
/// failures.
#[instrument(skip_all, fields(tool = %invocation.tool_name, url = %invocation.options.url))]
pub async fn run<T, O, E>(
    invocation: &Invocation,
    transport: &T,
    console: &mut Console<O, E>,
) -> Result<TransferOutcome, RunError>
where
    T: Transport + ?Sized,
    O: AsyncWrite + Unpin + Send,
    E: Write,
{
    let options = &invocation.options;
    let url =
        parse_url(&options.url).ok_or_else(|| AbortError::malformed_url(options.url.clone()))?;

    let request = build_request(&url, options).await?;
    if options.verbose {
        write_lines(&mut console.err, &format_request_echo(&request))?;
    }

    let started = Instant::now();
    let mut response = transport.execute(request).await?;
    debug!(status = response.status, "response received");

    if options.verbose {
        write_lines(&mut console.err, &format_response_echo(&response, true))?;
    }
    if options.fail && response.is_error_status() {
        return Err(AbortError::HttpStatus {
            status: response.status,
        }
        .into());
    }

    let destination = resolve_output_file_name(&url, options, &response.headers)
        .map_or(Destination::Stdout, Destination::File);
    let bytes_transferred = match &destination {
        Destination::Stdout => {
            let decode_text = console.out_is_terminal;
            deliver(&mut response, &mut console.out, options.include, decode_text).await?
        }
        Destination::File(path) => {
            let file = File::create(path)
                .await
                .map_err(|e| AbortError::output_file(path.clone(), e))?;
            let mut writer = BufWriter::new(file);
            deliver(&mut response, &mut writer, options.include, false).await?
        }
    };

    let outcome = TransferOutcome {
        destination,
        bytes_transferred,
        elapsed: started.elapsed(),
    };
    info!(
        destination = %outcome.destination,
        bytes = outcome.bytes_transferred,
        elapsed_ms = outcome.elapsed.as_millis(),
        "transfer complete"
    );
    write_lines(
        &mut console.err,
        &outcome.report_lines(options.silent, console.out_is_terminal),
    )?;
    Ok(outcome)
}

/// Prints `error` for the user and returns the process exit code.
///
/// Abort conditions print `<tool>: <message>`, unless `silent` is set
/// without `show_error`. Unexpected failures always print, with their full
/// cause chain.
pub fn report_failure<W: Write>(
    tool_name: &str,
    error: &RunError,
    silent: bool,
    show_error: bool,
    writer: &mut W,
) -> u8 {
    match error.abort() {
        Some(abort) => {
            if !silent || show_error {
                let _ = writeln!(writer, "{tool_name}: {abort}");
            }
        }
        None => {
            let _ = writeln!(writer, "{tool_name}: {error}");
            let mut source = StdError::source(error);
            while let Some(cause) = source {
                let _ = writeln!(writer, "  caused by: {cause}");
                source = cause.source();
            }
        }
    }
    error.exit_code()
}

/// Writes the optional include header block, then the body.
async fn deliver<W>(
    response: &mut ResponseHandle,
    writer: &mut W,
    include: bool,
    decode_text: bool,
) -> Result<u64, RunError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if include {
        let mut head = format_response_echo(response, false).join("\n");
        head.push('\n');
        writer
            .write_all(head.as_bytes())
            .await
            .map_err(RunError::Write)?;
    }
    match response.body.take() {
        Some(body) => stream_body(body, writer, decode_text).await,
        None => {
            writer.flush().await.map_err(RunError::Write)?;
            Ok(0)
        }
    }
}

fn write_lines<E: Write>(err: &mut E, lines: &[String]) -> Result<(), RunError> {
    for line in lines {
        writeln!(err, "{line}").map_err(RunError::Write)?;
    }
    Ok(())
}
