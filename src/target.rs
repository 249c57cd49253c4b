//! Target URL acceptance and normalisation.

use std::fmt;

use tracing::debug;
use url::Url;

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// A validated `http`/`https` URL naming the transfer target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl(Url);

impl TargetUrl {
    /// The underlying parsed URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Value for the `Host` header: host name plus the port when it is not
    /// the scheme's default.
    #[must_use]
    pub fn host_header(&self) -> String {
        let host = self.0.host_str().unwrap_or_default();
        match self.0.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// Host name without port, as used in resolution error messages.
    #[must_use]
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// Path plus query, as written on the HTTP request line.
    #[must_use]
    pub fn request_target(&self) -> String {
        match self.0.query() {
            Some(query) => format!("{}?{query}", self.0.path()),
            None => self.0.path().to_string(),
        }
    }

    /// Last non-empty path segment, still percent-encoded.
    #[must_use]
    pub fn last_path_segment(&self) -> Option<&str> {
        self.0
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
    }

    /// Returns a copy with `segment` appended when the path ends in `/`.
    #[must_use]
    pub fn with_trailing_segment(&self, segment: &str) -> Self {
        if !self.0.path().ends_with('/') || segment.is_empty() {
            return self.clone();
        }
        let mut url = self.0.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        Self(url)
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Parses a command-line URL argument.
///
/// Bare hosts (`example.com`, `localhost:8080/x`) are accepted by retrying
/// once with an `http://` prefix. Only `http` and `https` are allowed; every
/// other outcome is `None`.
///
/// # Examples
///
/// ```
/// use xcurl_core::target::parse_url;
///
/// assert_eq!(parse_url("example.com"), parse_url("http://example.com"));
/// assert!(parse_url("ftp://example.com").is_none());
/// ```
#[must_use]
pub fn parse_url(input: &str) -> Option<TargetUrl> {
    let input = input.trim();
    let parsed = match Url::parse(input) {
        Ok(url) if !looks_like_host_and_port(&url) => Some(url),
        _ => Url::parse(&format!("http://{input}")).ok(),
    };

    let Some(url) = parsed else {
        debug!(input = %input, "URL could not be parsed");
        return None;
    };

    if !ALLOWED_SCHEMES.contains(&url.scheme()) || url.host_str().is_none_or(str::is_empty) {
        debug!(input = %input, scheme = %url.scheme(), "URL rejected");
        return None;
    }

    Some(TargetUrl(url))
}

/// `localhost:8080` parses as scheme `localhost` with an opaque path `8080`.
fn looks_like_host_and_port(url: &Url) -> bool {
    url.cannot_be_a_base() && url.path().starts_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_bare_host_gets_http_scheme() {
        let bare = parse_url("example.com").unwrap();
        assert_eq!(Some(bare.clone()), parse_url("http://example.com"));
        assert_eq!(bare.as_str(), "http://example.com/");
    }

    #[test]
    fn test_parse_url_bare_host_with_port_and_path() {
        let url = parse_url("localhost:8080/api?q=1").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_header(), "localhost:8080");
        assert_eq!(url.request_target(), "/api?q=1");
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        assert!(parse_url("ftp://example.com").is_none());
        assert!(parse_url("file:///etc/passwd").is_none());
        assert!(parse_url("mailto:someone@example.com").is_none());
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        assert!(parse_url("").is_none());
        assert!(parse_url("   ").is_none());
        assert!(parse_url("exa mple.com").is_none());
    }

    #[test]
    fn test_parse_url_accepts_https() {
        let url = parse_url("https://example.com:443/a/b.txt").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_header(), "example.com");
        assert_eq!(url.last_path_segment(), Some("b.txt"));
    }

    #[test]
    fn test_host_header_keeps_non_default_port() {
        let url = parse_url("https://example.com:8443/").unwrap();
        assert_eq!(url.host_header(), "example.com:8443");
        assert_eq!(url.host(), "example.com");
    }

    #[test]
    fn test_last_path_segment_empty_for_directory() {
        assert_eq!(parse_url("http://example.com/dir/").unwrap().last_path_segment(), None);
        assert_eq!(parse_url("http://example.com").unwrap().last_path_segment(), None);
    }

    #[test]
    fn test_with_trailing_segment_only_appends_to_directories() {
        let dir = parse_url("http://example.com/upload/").unwrap();
        assert_eq!(
            dir.with_trailing_segment("report.csv").as_str(),
            "http://example.com/upload/report.csv"
        );

        let file = parse_url("http://example.com/upload/name.bin").unwrap();
        assert_eq!(file.with_trailing_segment("report.csv"), file);
    }
}
