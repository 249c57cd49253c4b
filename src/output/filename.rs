//! Output file name resolution and sanitization.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::headers::{HeaderMap, parse_header_value};
use crate::options::TransferOptions;
use crate::target::TargetUrl;

/// `--output` value that stands for standard output.
const STDOUT_NAME: &str = "-";

/// Decides where the response body goes. `None` means standard output.
///
/// Priority:
/// 1. an explicit `--output` path, made absolute against the current
///    directory (`-` selects standard output);
/// 2. under `--remote-name --remote-header-name`, the `filename` parameter of
///    the response's `content-disposition` header;
/// 3. under `--remote-name`, the last path segment of `url`.
///
/// Names taken from the server (2 and 3) are sanitized and stay relative, so
/// they always land in the current directory.
#[must_use]
pub fn resolve_output_file_name(
    url: &TargetUrl,
    options: &TransferOptions,
    headers: &HeaderMap,
) -> Option<PathBuf> {
    if let Some(output) = &options.output {
        if output.as_os_str() == STDOUT_NAME {
            return None;
        }
        return Some(absolute(output));
    }

    if !options.remote_name {
        return None;
    }

    if options.remote_header_name
        && let Some(name) = content_disposition_file_name(headers)
    {
        debug!(file = %name, "file name from content-disposition");
        return Some(PathBuf::from(name));
    }

    let name = url
        .last_path_segment()
        .map(|segment| {
            urlencoding::decode(segment)
                .map_or_else(|_| segment.to_string(), std::borrow::Cow::into_owned)
        })
        .map(|segment| sanitize_filename(&segment))
        .filter(|name| !name.is_empty());
    if name.is_none() {
        debug!(url = %url, "URL has no file name; writing to standard output");
    }
    name.map(PathBuf::from)
}

fn content_disposition_file_name(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("content-disposition")?;
    let parsed = parse_header_value(&raw);
    parsed
        .param("filename")
        .map(sanitize_filename)
        .filter(|name| !name.is_empty())
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Makes a server-provided name safe to create in the current directory.
///
/// Path separators and characters reserved on common filesystems become `_`.
/// A name that would still resolve outside the directory (`..`, `.`) has its
/// dots replaced as well. Surrounding whitespace is dropped.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
