//! Request and response header echo for `--verbose` and `--include`.

use crate::request::RequestDescriptor;
use crate::transport::ResponseHandle;

/// HTTP version written on echoed status and request lines.
const HTTP_VERSION: &str = "HTTP/1.1";

/// `> METHOD target HTTP/1.1`, one `> name: value` line per header, then a
/// bare `>`.
#[must_use]
pub fn format_request_echo(request: &RequestDescriptor) -> Vec<String> {
    let mut lines = Vec::with_capacity(request.headers.len() + 2);
    lines.push(format!(
        "> {} {} {HTTP_VERSION}",
        request.method,
        request.url.request_target()
    ));
    lines.extend(
        request
            .headers
            .entries()
            .into_iter()
            .map(|(name, value)| format!("> {name}: {value}")),
    );
    lines.push(">".to_string());
    lines
}

/// Status line and headers of `response`.
///
/// Verbose echo prefixes each line with `< ` and ends with a bare `<`; the
/// include form is unprefixed and ends with an empty line separating it from
/// the body.
#[must_use]
pub fn format_response_echo(response: &ResponseHandle, verbose: bool) -> Vec<String> {
    let prefix = if verbose { "< " } else { "" };
    let status_line = format!("{HTTP_VERSION} {} {}", response.status, response.status_text);

    let mut lines = Vec::with_capacity(response.headers.len() + 2);
    lines.push(format!("{prefix}{}", status_line.trim_end()));
    lines.extend(
        response
            .headers
            .entries()
            .into_iter()
            .map(|(name, value)| format!("{prefix}{name}: {value}")),
    );
    lines.push(if verbose { "<".to_string() } else { String::new() });
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::headers::HeaderMap;
    use crate::request::{Method, RedirectPolicy, RequestBody};
    use crate::target::parse_url;

    fn response() -> ResponseHandle {
        let mut headers = HeaderMap::new();
        headers.append("content-type", "text/plain");
        headers.append("set-cookie", "a=1");
        headers.append("set-cookie", "b=2");
        ResponseHandle {
            status: 200,
            status_text: "OK".to_string(),
            headers,
            body: None,
        }
    }

    #[test]
    fn test_request_echo_format() {
        let mut headers = HeaderMap::new();
        headers.set("Host", "example.com");
        headers.set("Accept", "*/*");
        let request = RequestDescriptor {
            url: parse_url("http://example.com/search?q=rust").unwrap(),
            method: Method::Get,
            headers,
            body: RequestBody::Empty,
            redirect: RedirectPolicy::Manual,
        };

        assert_eq!(
            format_request_echo(&request),
            vec![
                "> GET /search?q=rust HTTP/1.1",
                "> Host: example.com",
                "> Accept: */*",
                ">",
            ]
        );
    }

    #[test]
    fn test_verbose_response_echo_is_prefixed() {
        assert_eq!(
            format_response_echo(&response(), true),
            vec![
                "< HTTP/1.1 200 OK",
                "< content-type: text/plain",
                "< set-cookie: a=1, b=2",
                "<",
            ]
        );
    }

    #[test]
    fn test_include_response_echo_ends_with_blank_line() {
        let lines = format_response_echo(&response(), false);
        assert_eq!(lines.first().unwrap(), "HTTP/1.1 200 OK");
        assert_eq!(lines.last().unwrap(), "");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_status_line_without_reason_has_no_trailing_space() {
        let mut unknown = response();
        unknown.status = 599;
        unknown.status_text = String::new();
        assert_eq!(format_response_echo(&unknown, false)[0], "HTTP/1.1 599");
    }
}
