//! The seam between request construction and the network.
//!
//! The session only talks to a [`Transport`]; [`ReqwestTransport`] is the
//! production implementation and tests substitute in-memory ones.

mod http;

pub use http::ReqwestTransport;

use std::error::Error as StdError;
use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

use crate::headers::HeaderMap;
use crate::request::RequestDescriptor;

/// Response body chunks, in arrival order.
pub type ResponseBody = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// Status line, headers and (not yet consumed) body of a response.
pub struct ResponseHandle {
    pub status: u16,
    /// Reason phrase from the status line. Falls back to the canonical
    /// phrase, which is empty for unregistered codes.
    pub status_text: String,
    pub headers: HeaderMap,
    /// `None` when the response cannot carry a body (`HEAD`).
    pub body: Option<ResponseBody>,
}

impl ResponseHandle {
    /// True for 4xx and 5xx statuses.
    #[must_use]
    pub fn is_error_status(&self) -> bool {
        self.status >= 400
    }
}

impl std::fmt::Debug for ResponseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseHandle")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("headers", &self.headers)
            .field("body", &self.body.is_some())
            .finish()
    }
}

/// Errors raised while sending a request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Name resolution for the target host failed.
    #[error("could not resolve host {host}")]
    UnresolvedHost {
        host: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Any other failure of the HTTP client.
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A header name or value cannot be sent on the wire.
    #[error("invalid header {name}")]
    InvalidHeader { name: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

/// Sends one request and hands back the response as soon as its head
/// arrives.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes `request`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response head could be obtained.
    async fn execute(&self, request: RequestDescriptor) -> Result<ResponseHandle, TransportError>;
}

/// Error-chain fragments that identify a failed DNS lookup.
const RESOLUTION_MARKERS: [&str; 4] = [
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
];

/// True when any error in the chain of `error` describes a name-resolution
/// failure.
pub(crate) fn is_resolution_failure(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        let message = err.to_string().to_ascii_lowercase();
        if RESOLUTION_MARKERS.iter().any(|marker| message.contains(marker)) {
            return true;
        }
        current = err.source();
    }
    false
}
