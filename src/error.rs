//! Error types for a transfer invocation.
//!
//! [`AbortError`] covers the conditions a user can act on: each renders as a
//! single short line and carries a curl-compatible exit code. Everything else
//! is an unexpected failure and is reported with its full cause chain.

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Exit code for unexpected failures.
pub const UNEXPECTED_EXIT_CODE: u8 = 1;

/// User-facing, terminal conditions.
#[derive(Debug, Error)]
pub enum AbortError {
    /// No positional URL argument was given.
    #[error("no URL specified")]
    NoUrl,

    /// An option token the tool does not know.
    #[error("option {option}: is unknown")]
    UnknownOption {
        /// The offending token as typed.
        option: String,
    },

    /// More than one positional argument.
    #[error("only one URL may be given, found {count}")]
    TooManyUrls {
        /// Number of positional arguments seen.
        count: usize,
    },

    /// The URL did not parse or uses a scheme other than http/https.
    #[error("URL using bad/illegal format or missing URL: {url}")]
    MalformedUrl {
        /// The URL argument as given.
        url: String,
    },

    /// DNS resolution of the target host failed.
    #[error("Could not resolve host: {host}")]
    UnresolvedHost {
        /// Host name that failed to resolve.
        host: String,
    },

    /// A local file named as the request body could not be opened.
    #[error("Failed to open/read local data from file {}: {source}", path.display())]
    BodyFile {
        /// Path of the body file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The output file could not be created.
    #[error("Failed to create the file {}: {source}", path.display())]
    OutputFile {
        /// Path of the destination file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// `--fail` was given and the server answered 4xx/5xx.
    #[error("The requested URL returned error: {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },
}

impl AbortError {
    /// Creates a body-file error.
    pub fn body_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::BodyFile {
            path: path.into(),
            source,
        }
    }

    /// Creates an output-file error.
    pub fn output_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a malformed URL error.
    pub fn malformed_url(url: impl Into<String>) -> Self {
        Self::MalformedUrl { url: url.into() }
    }

    /// Process exit code, following curl's numbering.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NoUrl | Self::UnknownOption { .. } | Self::TooManyUrls { .. } => 2,
            Self::MalformedUrl { .. } => 3,
            Self::UnresolvedHost { .. } => 6,
            Self::HttpStatus { .. } => 22,
            Self::OutputFile { .. } => 23,
            Self::BodyFile { .. } => 26,
        }
    }
}

/// Any failure of a transfer invocation.
#[derive(Debug, Error)]
pub enum RunError {
    /// A user-facing condition.
    #[error(transparent)]
    Abort(#[from] AbortError),

    /// The transport failed for a reason the tool does not recognise.
    #[error("transport failure")]
    Transport(#[source] TransportError),

    /// Reading the response body failed part-way.
    #[error("failed reading response body after {bytes} bytes")]
    BodyRead {
        /// Bytes received before the failure.
        bytes: u64,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing to the destination failed part-way.
    #[error("failed writing output")]
    Write(#[source] std::io::Error),
}

impl RunError {
    /// Returns the abort condition, if this is one.
    #[must_use]
    pub fn abort(&self) -> Option<&AbortError> {
        match self {
            Self::Abort(abort) => Some(abort),
            _ => None,
        }
    }

    /// Process exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.abort()
            .map_or(UNEXPECTED_EXIT_CODE, AbortError::exit_code)
    }
}

impl From<TransportError> for RunError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::UnresolvedHost { host, .. } => {
                Self::Abort(AbortError::UnresolvedHost { host })
            }
            other => Self::Transport(other),
        }
    }
}
