//! xcurl Core Library
//!
//! The engine behind the `xcurl` command-line HTTP client: it turns a parsed
//! option set into a wire-correct request, sends it through a transport, and
//! streams the response to standard output or a file.
//!
//! # Architecture
//!
//! - [`headers`] - Ordered case-insensitive header map and structured value parser
//! - [`target`] - URL acceptance with bare-host fallback
//! - [`options`] - The fully-parsed option set for one transfer
//! - [`request`] - Request construction (headers, body source, method inference)
//! - [`transport`] - The network seam and its reqwest implementation
//! - [`output`] - Output file naming, body streaming and header echo
//! - [`session`] - Per-invocation orchestration and failure reporting
//! - [`error`] - Abort conditions and exit codes

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod headers;
pub mod options;
pub mod output;
pub mod request;
pub mod session;
pub mod target;
pub mod transport;
pub mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use error::{AbortError, RunError};
pub use headers::{HeaderMap, ParsedHeaderValue, parse_header_value};
pub use options::TransferOptions;
pub use output::{Destination, TransferOutcome, resolve_output_file_name};
pub use request::{Method, RedirectPolicy, RequestBody, RequestDescriptor, build_request};
pub use session::{Console, Invocation, report_failure, run};
pub use target::{TargetUrl, parse_url};
pub use transport::{ReqwestTransport, ResponseHandle, Transport, TransportError};
