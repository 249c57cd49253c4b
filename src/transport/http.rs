//! `reqwest`-backed [`Transport`].

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Body, Client};
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use super::{ResponseHandle, Transport, TransportError, is_resolution_failure};
use crate::headers::HeaderMap;
use crate::request::{Method, RedirectPolicy, RequestBody, RequestDescriptor};
use crate::target::TargetUrl;

/// Connect timeout for every request.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Redirect hops followed under `--location`.
const MAX_REDIRECTS: usize = 50;

/// Production transport.
///
/// Holds one client per redirect policy so a single instance serves both
/// `--location` and plain invocations. Response bodies are passed through
/// untouched: no content decoding is negotiated or applied.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    follow: Client,
    manual: Client,
}

impl ReqwestTransport {
    /// Builds both clients.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the TLS backend or system
    /// configuration cannot be initialised.
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            follow: build_client(Policy::limited(MAX_REDIRECTS))?,
            manual: build_client(Policy::none())?,
        })
    }

    fn client(&self, redirect: RedirectPolicy) -> &Client {
        match redirect {
            RedirectPolicy::Follow => &self.follow,
            RedirectPolicy::Manual => &self.manual,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: RequestDescriptor) -> Result<ResponseHandle, TransportError> {
        let RequestDescriptor {
            url,
            method,
            headers,
            body,
            redirect,
        } = request;

        let mut builder = self
            .client(redirect)
            .request(wire_method(method), url.as_url().clone())
            .headers(wire_headers(&headers)?);
        if let Some(body) = wire_body(body) {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| classify(&url, e))?;

        let status = response.status();
        let status_text = reason_phrase(&response);
        let mut response_headers = HeaderMap::new();
        for (name, value) in response.headers() {
            response_headers.append(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        debug!(
            status = status.as_u16(),
            headers = response_headers.len(),
            final_url = %response.url(),
            "response head received"
        );

        let body = (method != Method::Head).then(|| {
            Box::pin(response.bytes_stream().map_err(io::Error::other)) as super::ResponseBody
        });

        Ok(ResponseHandle {
            status: status.as_u16(),
            status_text,
            headers: response_headers,
            body,
        })
    }
}

/// Reason phrase as sent by the server, falling back to the canonical one.
fn reason_phrase(response: &reqwest::Response) -> String {
    match response.extensions().get::<hyper::ext::ReasonPhrase>() {
        Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

fn build_client(policy: Policy) -> Result<Client, TransportError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(policy)
        .build()
        .map_err(TransportError::Client)
}

fn wire_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

fn wire_headers(headers: &HeaderMap) -> Result<reqwest::header::HeaderMap, TransportError> {
    let mut wire = reqwest::header::HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter_values() {
        let invalid = || TransportError::InvalidHeader {
            name: name.to_string(),
        };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|_| invalid())?;
        wire.append(name, value);
    }
    Ok(wire)
}

fn wire_body(body: RequestBody) -> Option<Body> {
    match body {
        RequestBody::Empty => None,
        RequestBody::Buffer(bytes) => Some(Body::from(bytes)),
        RequestBody::Stream { reader, .. } => Some(Body::wrap_stream(ReaderStream::new(reader))),
    }
}

fn classify(url: &TargetUrl, error: reqwest::Error) -> TransportError {
    if is_resolution_failure(&error) {
        debug!(host = %url.host(), "host name resolution failed");
        TransportError::UnresolvedHost {
            host: url.host().to_string(),
            source: Box::new(error),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}
