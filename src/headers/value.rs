//! Tolerant parser for parameterised header values.
//!
//! Handles the `type; key=value; key*=charset'lang'encoded` shape used by
//! `content-disposition` (RFC 6266) and similar headers, including quoted
//! strings with escapes and RFC 2231/5987 extended parameters. Real servers
//! send plenty of non-conformant values, so parsing never fails: degenerate
//! input yields an empty token and/or an empty parameter map.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

/// A quoted string, allowing backslash escapes inside.
#[allow(clippy::expect_used)]
static QUOTED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:\\.|[^"])*""#).expect("quoted value regex is valid")
});

#[allow(clippy::expect_used)]
static ESCAPED_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(.)").expect("escape regex is valid"));

/// RFC 2231/5987 `charset'language'` prefix on an extended parameter value.
#[allow(clippy::expect_used)]
static CHARSET_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:UTF-8|ISO-8859-1)'[A-Za-z0-9_]*'").expect("charset regex is valid")
});

/// Primary token plus decoded parameters of a structured header value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeaderValue {
    /// Lower-cased primary token (`attachment`, `inline`, `text/html`, ...).
    pub token: String,
    /// Lower-cased parameter names mapped to decoded values.
    pub params: HashMap<String, String>,
}

impl ParsedHeaderValue {
    /// Returns the decoded value of parameter `name` (lower-case).
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Parses a structured header value into its token and parameters.
///
/// Quoted substrings are swapped for numbered placeholders before splitting,
/// so `;` and `=` inside quotes never act as delimiters. Duplicate parameters
/// resolve to the last occurrence.
///
/// # Examples
///
/// ```
/// use xcurl_core::headers::parse_header_value;
///
/// let parsed = parse_header_value(r#"attachment; filename="a;b.pdf""#);
/// assert_eq!(parsed.token, "attachment");
/// assert_eq!(parsed.param("filename"), Some("a;b.pdf"));
/// ```
#[must_use]
pub fn parse_header_value(raw: &str) -> ParsedHeaderValue {
    let mut substitutions: HashMap<String, String> = HashMap::new();
    let normalized = QUOTED_VALUE.replace_all(raw, |caps: &Captures<'_>| {
        let placeholder = format!("\"{}\"", substitutions.len() + 1);
        substitutions.insert(placeholder.clone(), unquote(&caps[0]));
        placeholder
    });

    let restore = |value: &str| -> String {
        QUOTED_VALUE
            .replace_all(value, |caps: &Captures<'_>| {
                substitutions
                    .get(&caps[0])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    };

    let mut parts = normalized.split(';');
    let first = parts.next().unwrap_or_default();
    // Lenient: `filename=foo` with no type keeps only `filename`.
    let token = restore(first.split('=').next().unwrap_or_default())
        .trim()
        .to_lowercase();

    let mut params = HashMap::new();
    for part in parts {
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        let key = restore(key);
        let key = key.trim();
        let key = key.strip_suffix('*').unwrap_or(key).to_lowercase();
        if key.is_empty() {
            continue;
        }
        let value = restore(value);
        let value = CHARSET_PREFIX.replace(value.trim(), "");
        params.insert(key, percent_decode(&value));
    }

    trace!(token = %token, params = params.len(), "parsed header value");
    ParsedHeaderValue { token, params }
}

fn unquote(quoted: &str) -> String {
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(quoted);
    ESCAPED_CHAR.replace_all(inner, "$1").into_owned()
}

/// Percent-decodes as UTF-8, falling back to Latin-1 escapes for byte
/// sequences that are not valid UTF-8. Malformed escapes stay as written.
fn percent_decode(input: &str) -> String {
    let decoded = urlencoding::decode_binary(input.as_bytes());
    match String::from_utf8(decoded.into_owned()) {
        Ok(text) => text,
        Err(_) => unescape_latin1(input),
    }
}

fn unescape_latin1(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(position) = rest.find('%') {
        out.push_str(&rest[..position]);
        let escape = &rest[position + 1..];
        if let Some(ch) = unicode_escape(escape) {
            out.push(ch);
            rest = &escape[5..];
        } else if let Some(byte) = hex_value(escape, 2).and_then(|v| u8::try_from(v).ok()) {
            out.push(char::from(byte));
            rest = &escape[2..];
        } else {
            out.push('%');
            rest = escape;
        }
    }
    out.push_str(rest);
    out
}

/// `%uXXXX` escape (the `u` and four hex digits follow the `%`).
fn unicode_escape(escape: &str) -> Option<char> {
    let digits = escape.strip_prefix('u')?;
    hex_value(digits, 4).and_then(char::from_u32)
}

fn hex_value(s: &str, width: usize) -> Option<u32> {
    let digits = s.get(..width)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
