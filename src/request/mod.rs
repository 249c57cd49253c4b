//! Request construction from a target URL and transfer options.
//!
//! [`build_request`] merges default and user headers, selects the body
//! source, infers the method and derives the framing headers. The resulting
//! [`RequestDescriptor`] is what the transport sends.
//!
//! # Example
//!
//! ```no_run
//! use xcurl_core::options::TransferOptions;
//! use xcurl_core::request::build_request;
//! use xcurl_core::target::parse_url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut options = TransferOptions::for_url("example.com/form");
//! options.data = Some("foo=bar".to_string());
//! let url = parse_url(&options.url).ok_or("bad url")?;
//! let request = build_request(&url, &options).await?;
//! assert_eq!(request.method.as_str(), "POST");
//! # Ok(())
//! # }
//! ```

mod body;

pub use body::{BodyReader, RequestBody};

use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, instrument};

use crate::error::AbortError;
use crate::headers::HeaderMap;
use crate::options::TransferOptions;
use crate::target::TargetUrl;
use crate::user_agent::default_user_agent;
use body::{BodySource, STDIN_NAME, open_body, select_body_source};

/// Default content type for bodies without an explicit `Content-Type`.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Parses a method name case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Upper-case wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Methods that conventionally carry a request body.
    #[must_use]
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the transport follows redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    Follow,
    #[default]
    Manual,
}

/// Everything the transport needs to send one request.
#[derive(Debug)]
pub struct RequestDescriptor {
    pub url: TargetUrl,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub redirect: RedirectPolicy,
}

/// Builds the request for `url` from `options`.
///
/// Header precedence: a basic credential sets `Authorization` first, user
/// `-H` headers are applied over it (later entries win), then `Host`,
/// `User-Agent` and `Accept` are filled in only where still absent.
///
/// A body forces a body-carrying method: with no explicit method, or with
/// one such as `GET`, a data body is sent as `POST` (uploads as `PUT`).
///
/// # Errors
///
/// Returns [`AbortError::BodyFile`] when the body is read from a local file
/// that cannot be opened. Nothing else fails.
#[instrument(skip_all, fields(url = %url))]
pub async fn build_request(
    url: &TargetUrl,
    options: &TransferOptions,
) -> Result<RequestDescriptor, AbortError> {
    let mut headers = HeaderMap::new();
    if let Some(credential) = options.user.as_deref() {
        headers.set(
            "Authorization",
            format!("Basic {}", BASE64.encode(credential.as_bytes())),
        );
    }
    for line in &options.headers {
        match parse_header_line(line) {
            Some((name, value)) => headers.set(name, value),
            None => debug!(header = %line, "ignoring header without a colon"),
        }
    }
    let user_agent = options
        .user_agent
        .clone()
        .unwrap_or_else(default_user_agent);
    for (name, value) in [
        ("Host", url.host_header()),
        ("User-Agent", user_agent),
        ("Accept", "*/*".to_string()),
    ] {
        if !headers.has(name) {
            headers.set(name, value);
        }
    }

    let source = select_body_source(options);
    let url = match source {
        BodySource::Upload(name) if name != STDIN_NAME => {
            url.with_trailing_segment(&upload_file_name(name))
        }
        _ => url.clone(),
    };
    let body = open_body(source).await?;

    let explicit = options.method.as_deref().and_then(|name| {
        let parsed = Method::parse(name);
        if parsed.is_none() {
            debug!(method = %name, "unsupported method requested; inferring instead");
        }
        parsed
    });
    let method = infer_method(explicit, &body, source.is_upload());

    if body.is_present() {
        if !headers.has("Content-Type") {
            headers.set("Content-Type", FORM_URLENCODED);
        }
        match body.known_length() {
            Some(length) => headers.set("Content-Length", length.to_string()),
            None => headers.set("Transfer-Encoding", "chunked"),
        }
    }

    let redirect = if options.location {
        RedirectPolicy::Follow
    } else {
        RedirectPolicy::Manual
    };

    debug!(method = %method, headers = headers.len(), body = ?body, "request built");
    Ok(RequestDescriptor {
        url,
        method,
        headers,
        body,
        redirect,
    })
}

fn infer_method(explicit: Option<Method>, body: &RequestBody, upload: bool) -> Method {
    if !body.is_present() {
        return explicit.unwrap_or(Method::Get);
    }
    let fallback = if upload { Method::Put } else { Method::Post };
    explicit.filter(|m| m.carries_body()).unwrap_or(fallback)
}

/// Splits `Name: value` on the first colon. Lines without a colon or with
/// an empty name are ignored.
fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    (!name.is_empty()).then(|| (name, value.trim()))
}

fn upload_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::target::parse_url;
    use tokio::io::AsyncReadExt;

    fn target() -> TargetUrl {
        parse_url("http://example.com/path").unwrap()
    }

    async fn build(options: &TransferOptions) -> RequestDescriptor {
        build_request(&target(), options).await.unwrap()
    }

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("Post"), Some(Method::Post));
        assert_eq!(Method::parse("OPTIONS"), Some(Method::Options));
        assert_eq!(Method::parse("PATCH"), None);
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_parse_header_line_splits_on_first_colon() {
        assert_eq!(
            parse_header_line("X-Url: http://a/b"),
            Some(("X-Url", "http://a/b"))
        );
        assert_eq!(parse_header_line("  Accept :text/html "), Some(("Accept", "text/html")));
        assert_eq!(parse_header_line("X-Empty:"), Some(("X-Empty", "")));
        assert_eq!(parse_header_line("no colon here"), None);
        assert_eq!(parse_header_line(": value"), None);
    }

    #[tokio::test]
    async fn test_plain_request_is_get_with_default_headers() {
        let request = build(&TransferOptions::for_url("example.com/path")).await;

        assert_eq!(request.method, Method::Get);
        assert!(!request.body.is_present());
        assert_eq!(request.redirect, RedirectPolicy::Manual);
        assert_eq!(
            request.headers.entries(),
            vec![
                ("Host".to_string(), "example.com".to_string()),
                ("User-Agent".to_string(), default_user_agent()),
                ("Accept".to_string(), "*/*".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_data_infers_post_with_form_framing() {
        let mut options = TransferOptions::for_url("example.com");
        options.data = Some("foo=bar".to_string());

        let request = build(&options).await;
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.headers.get("content-type").as_deref(),
            Some(FORM_URLENCODED)
        );
        assert_eq!(request.headers.get("content-length").as_deref(), Some("7"));
        assert!(!request.headers.has("transfer-encoding"));
        assert!(matches!(&request.body, RequestBody::Buffer(b) if b.as_ref() == b"foo=bar"));
    }

    #[tokio::test]
    async fn test_get_with_body_is_upgraded_to_post() {
        let mut options = TransferOptions::for_url("example.com");
        options.data = Some("x=1".to_string());
        options.method = Some("get".to_string());
        assert_eq!(build(&options).await.method, Method::Post);

        options.method = Some("DELETE".to_string());
        assert_eq!(build(&options).await.method, Method::Post);

        options.method = Some("put".to_string());
        assert_eq!(build(&options).await.method, Method::Put);
    }

    #[tokio::test]
    async fn test_explicit_method_without_body_is_kept() {
        let mut options = TransferOptions::for_url("example.com");
        options.method = Some("head".to_string());
        assert_eq!(build(&options).await.method, Method::Head);

        options.method = Some("patch".to_string());
        assert_eq!(build(&options).await.method, Method::Get);
    }

    #[tokio::test]
    async fn test_user_host_header_is_not_overwritten() {
        let mut options = TransferOptions::for_url("example.com");
        options.headers = vec!["host: other.test".to_string()];

        let request = build(&options).await;
        assert_eq!(request.headers.get("Host").as_deref(), Some("other.test"));
        assert_eq!(
            request
                .headers
                .entries()
                .iter()
                .filter(|(name, _)| name.eq_ignore_ascii_case("host"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_user_authorization_beats_credential_option() {
        let mut options = TransferOptions::for_url("example.com");
        options.user = Some("user:pass".to_string());
        assert_eq!(
            build(&options).await.headers.get("authorization").as_deref(),
            Some("Basic dXNlcjpwYXNz")
        );

        options.headers = vec!["Authorization: Bearer token".to_string()];
        assert_eq!(
            build(&options).await.headers.get("authorization").as_deref(),
            Some("Bearer token")
        );
    }

    #[tokio::test]
    async fn test_repeated_user_headers_last_wins() {
        let mut options = TransferOptions::for_url("example.com");
        options.headers = vec![
            "X-Mode: first".to_string(),
            "invalid header".to_string(),
            "x-mode: second".to_string(),
        ];

        let request = build(&options).await;
        assert_eq!(request.headers.get("X-Mode").as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_user_agent_option_and_header_precedence() {
        let mut options = TransferOptions::for_url("example.com");
        options.user_agent = Some("probe/1.0".to_string());
        assert_eq!(
            build(&options).await.headers.get("user-agent").as_deref(),
            Some("probe/1.0")
        );

        options.headers = vec!["User-Agent: explicit".to_string()];
        assert_eq!(
            build(&options).await.headers.get("user-agent").as_deref(),
            Some("explicit")
        );
    }

    #[tokio::test]
    async fn test_user_content_type_is_kept() {
        let mut options = TransferOptions::for_url("example.com");
        options.data = Some("{}".to_string());
        options.headers = vec!["Content-Type: application/json".to_string()];

        let request = build(&options).await;
        assert_eq!(
            request.headers.get("content-type").as_deref(),
            Some("application/json")
        );
        assert_eq!(request.headers.get("content-length").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_data_file_body_uses_file_length() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("form.txt");
        std::fs::write(&path, "a=1&b=2").unwrap();

        let mut options = TransferOptions::for_url("example.com");
        options.data = Some(format!("@{}", path.display()));

        let request = build(&options).await;
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.headers.get("content-length").as_deref(), Some("7"));
        assert_eq!(
            request.headers.get("content-type").as_deref(),
            Some(FORM_URLENCODED)
        );
        let RequestBody::Stream { mut reader, .. } = request.body else {
            panic!("expected a stream body");
        };
        let mut content = String::new();
        reader.read_to_string(&mut content).await.unwrap();
        assert_eq!(content, "a=1&b=2");
    }

    #[tokio::test]
    async fn test_missing_data_file_is_an_abort() {
        let mut options = TransferOptions::for_url("example.com");
        options.data = Some("@/definitely/not/here.txt".to_string());

        let result = build_request(&target(), &options).await;
        assert!(matches!(result, Err(AbortError::BodyFile { .. })));
    }

    #[tokio::test]
    async fn test_stdin_body_is_chunked() {
        let mut options = TransferOptions::for_url("example.com");
        options.data = Some("@-".to_string());

        let request = build(&options).await;
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.headers.get("transfer-encoding").as_deref(),
            Some("chunked")
        );
        assert!(!request.headers.has("content-length"));
    }

    #[tokio::test]
    async fn test_raw_data_is_never_a_file_reference() {
        let mut options = TransferOptions::for_url("example.com");
        options.data_raw = Some("@literal".to_string());

        let request = build(&options).await;
        assert!(matches!(&request.body, RequestBody::Buffer(b) if b.as_ref() == b"@literal"));
        assert_eq!(request.headers.get("content-length").as_deref(), Some("8"));
    }

    #[tokio::test]
    async fn test_upload_file_defaults_to_put_and_appends_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let mut options = TransferOptions::for_url("example.com/upload/");
        options.upload_file = Some(path.display().to_string());
        let url = parse_url("http://example.com/upload/").unwrap();

        let request = build_request(&url, &options).await.unwrap();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.url.as_str(), "http://example.com/upload/report.csv");
        assert_eq!(request.headers.get("content-length").as_deref(), Some("8"));
        assert_eq!(
            request.headers.get("content-type").as_deref(),
            Some(FORM_URLENCODED),
            "uploads get the same Content-Type default as any other body"
        );
    }

    #[tokio::test]
    async fn test_location_option_follows_redirects() {
        let mut options = TransferOptions::for_url("example.com");
        options.location = true;
        assert_eq!(build(&options).await.redirect, RedirectPolicy::Follow);
    }
}
