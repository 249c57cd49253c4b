//! The fully-parsed option set for one transfer.
//!
//! The binary's argument parser fills this in; the library never looks at
//! process arguments itself.

use std::path::PathBuf;

/// Request-shaping and output options for a single invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// Raw target URL argument (validated later by [`crate::target::parse_url`]).
    pub url: String,
    /// `--data`: body text, or `@file` / `@-` to read it from a file / stdin.
    pub data: Option<String>,
    /// `--data-ascii`: same semantics as `data`.
    pub data_ascii: Option<String>,
    /// `--data-binary`: same semantics as `data`.
    pub data_binary: Option<String>,
    /// `--data-raw`: body text; a leading `@` is sent literally.
    pub data_raw: Option<String>,
    /// `--upload-file`: local file (or `-` for stdin) streamed as the body.
    pub upload_file: Option<String>,
    /// `--header` entries in `Name: value` form, in command-line order.
    pub headers: Vec<String>,
    /// `--request`: explicit HTTP method.
    pub method: Option<String>,
    /// `--user`: `user:password` basic credential.
    pub user: Option<String>,
    /// `--user-agent`: replaces the default client identifier.
    pub user_agent: Option<String>,
    /// `--output`: destination file (`-` means standard output).
    pub output: Option<PathBuf>,
    /// `--remote-name`: save under the remote file name.
    pub remote_name: bool,
    /// `--remote-header-name`: prefer the `content-disposition` file name.
    pub remote_header_name: bool,
    /// `--location`: follow redirects.
    pub location: bool,
    /// `--verbose`: echo request and response headers to stderr.
    pub verbose: bool,
    /// `--include`: write response headers before the body.
    pub include: bool,
    /// `--silent`: no progress, report, or error messages.
    pub silent: bool,
    /// `--show-error`: print abort messages even when silent.
    pub show_error: bool,
    /// `--fail`: abort on HTTP 4xx/5xx responses.
    pub fail: bool,
}

impl TransferOptions {
    /// Options for a plain GET of `url`.
    #[must_use]
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// True when abort messages should reach stderr.
    #[must_use]
    pub fn shows_errors(&self) -> bool {
        !self.silent || self.show_error
    }
}
