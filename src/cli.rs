//! CLI argument definitions using clap derive macros.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};

use xcurl_core::{AbortError, TransferOptions};

/// Separator curl uses when a data option is given more than once.
const DATA_JOIN: &str = "&";

/// Transfer a URL.
///
/// Sends one HTTP request and writes the response body to standard output
/// or a file.
#[derive(Parser, Debug)]
#[command(name = "xcurl")]
#[command(author, version, about)]
pub struct Args {
    /// HTTP POST data; `@file` reads it from a file, `@-` from stdin
    #[arg(short = 'd', long = "data", value_name = "data")]
    pub data: Vec<String>,

    /// HTTP POST ASCII data
    #[arg(long = "data-ascii", value_name = "data")]
    pub data_ascii: Vec<String>,

    /// HTTP POST binary data
    #[arg(long = "data-binary", value_name = "data")]
    pub data_binary: Vec<String>,

    /// HTTP POST data, '@' allowed
    #[arg(long = "data-raw", value_name = "data")]
    pub data_raw: Vec<String>,

    /// Transfer local FILE to destination
    #[arg(short = 'T', long = "upload-file", value_name = "file")]
    pub upload_file: Option<String>,

    /// Pass custom header(s) to server
    #[arg(short = 'H', long = "header", value_name = "header")]
    pub headers: Vec<String>,

    /// Specify request method to use
    #[arg(short = 'X', long = "request", value_name = "method")]
    pub request: Option<String>,

    /// Server user and password
    #[arg(short = 'u', long = "user", value_name = "user:password")]
    pub user: Option<String>,

    /// Send User-Agent <name> to server
    #[arg(short = 'A', long = "user-agent", value_name = "name")]
    pub user_agent: Option<String>,

    /// Write to file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "file")]
    pub output: Option<PathBuf>,

    /// Write output to a file named as the remote file
    #[arg(short = 'O', long = "remote-name")]
    pub remote_name: bool,

    /// Use the header-provided filename
    #[arg(short = 'J', long = "remote-header-name")]
    pub remote_header_name: bool,

    /// Follow redirects
    #[arg(short = 'L', long = "location")]
    pub location: bool,

    /// Make the operation more talkative
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Include protocol response headers in the output
    #[arg(short = 'i', long = "include")]
    pub include: bool,

    /// Silent mode
    #[arg(short = 's', long = "silent")]
    pub silent: bool,

    /// Show error even when -s is used
    #[arg(short = 'S', long = "show-error")]
    pub show_error: bool,

    /// Fail silently (no output at all) on HTTP errors
    #[arg(short = 'f', long = "fail")]
    pub fail: bool,

    /// Target URL
    #[arg(value_name = "url")]
    pub urls: Vec<String>,
}

/// Why the command line was not accepted.
#[derive(Debug)]
pub enum ParseFailure {
    /// A condition reported as `<tool>: <message>`.
    Abort(AbortError),
    /// Help, version, or a usage error clap renders itself.
    Clap(clap::Error),
}

/// Parses `argv` (program name first).
///
/// # Errors
///
/// Unknown option tokens become [`AbortError::UnknownOption`]; every other
/// clap outcome is returned for clap to print.
pub fn parse_args<I, T>(argv: I) -> Result<Args, ParseFailure>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Args::try_parse_from(argv).map_err(|error| {
        if error.kind() != ErrorKind::UnknownArgument {
            return ParseFailure::Clap(error);
        }
        match error.get(ContextKind::InvalidArg) {
            Some(ContextValue::String(option)) => {
                ParseFailure::Abort(AbortError::UnknownOption {
                    option: option.clone(),
                })
            }
            _ => ParseFailure::Clap(error),
        }
    })
}

impl Args {
    /// Converts the parsed arguments into library options.
    ///
    /// # Errors
    ///
    /// [`AbortError::NoUrl`] without a URL and [`AbortError::TooManyUrls`]
    /// with more than one.
    pub fn into_options(self) -> Result<TransferOptions, AbortError> {
        let url = match self.urls.len() {
            0 => return Err(AbortError::NoUrl),
            1 => self.urls.into_iter().next().unwrap_or_default(),
            count => return Err(AbortError::TooManyUrls { count }),
        };

        Ok(TransferOptions {
            url,
            data: join_data(self.data),
            data_ascii: join_data(self.data_ascii),
            data_binary: join_data(self.data_binary),
            data_raw: join_data(self.data_raw),
            upload_file: self.upload_file,
            headers: self.headers,
            method: self.request,
            user: self.user,
            user_agent: self.user_agent,
            output: self.output,
            remote_name: self.remote_name,
            remote_header_name: self.remote_header_name,
            location: self.location,
            verbose: self.verbose,
            include: self.include,
            silent: self.silent,
            show_error: self.show_error,
            fail: self.fail,
        })
    }
}

fn join_data(values: Vec<String>) -> Option<String> {
    (!values.is_empty()).then(|| values.join(DATA_JOIN))
}
