//! Request body source selection and opening.

use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use tokio::io::AsyncRead;
use tracing::debug;

use crate::error::AbortError;
use crate::options::TransferOptions;

/// Name that stands for standard input in `@-` and `--upload-file -`.
pub(crate) const STDIN_NAME: &str = "-";

/// A readable byte source for a streamed request body.
pub type BodyReader = Pin<Box<dyn AsyncRead + Send + Sync>>;

/// The request payload.
pub enum RequestBody {
    /// No body at all.
    Empty,
    /// Body held fully in memory.
    Buffer(Bytes),
    /// Body read from a file or standard input while sending.
    Stream {
        /// Source of the body bytes.
        reader: BodyReader,
        /// Total length when known up front (files); `None` for stdin.
        length: Option<u64>,
    },
}

impl RequestBody {
    /// True for every variant except [`RequestBody::Empty`].
    #[must_use]
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Empty)
    }

    /// Byte length when it is known before sending.
    #[must_use]
    pub fn known_length(&self) -> Option<u64> {
        match self {
            Self::Empty => Some(0),
            Self::Buffer(bytes) => Some(bytes.len() as u64),
            Self::Stream { length, .. } => *length,
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            Self::Stream { length, .. } => f.debug_struct("Stream").field("length", length).finish(),
        }
    }
}

/// Where the body comes from, before anything is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodySource<'a> {
    None,
    /// Literal text.
    Inline(&'a str),
    /// `@name` data: a local file, or stdin for `-`.
    DataFile(&'a str),
    /// `--upload-file`: a local file, or stdin for `-`.
    Upload(&'a str),
}

impl BodySource<'_> {
    pub(crate) fn is_upload(self) -> bool {
        matches!(self, Self::Upload(_))
    }
}

/// Picks the body source: upload file, then raw data (never a file
/// reference), then data/ascii/binary where `@name` reads from a file.
pub(crate) fn select_body_source(options: &TransferOptions) -> BodySource<'_> {
    if let Some(name) = options.upload_file.as_deref().filter(|n| !n.is_empty()) {
        return BodySource::Upload(name);
    }
    if let Some(raw) = options.data_raw.as_deref().filter(|d| !d.is_empty()) {
        return BodySource::Inline(raw);
    }
    let data = options
        .data
        .as_deref()
        .or(options.data_ascii.as_deref())
        .or(options.data_binary.as_deref())
        .filter(|d| !d.is_empty());
    match data {
        Some(data) => match data.strip_prefix('@') {
            Some(name) => BodySource::DataFile(name),
            None => BodySource::Inline(data),
        },
        None => BodySource::None,
    }
}

/// Opens the selected source.
///
/// # Errors
///
/// Returns [`AbortError::BodyFile`] when a named file cannot be opened or
/// its size cannot be read.
pub(crate) async fn open_body(source: BodySource<'_>) -> Result<RequestBody, AbortError> {
    match source {
        BodySource::None => Ok(RequestBody::Empty),
        BodySource::Inline(text) => Ok(RequestBody::Buffer(Bytes::copy_from_slice(
            text.as_bytes(),
        ))),
        BodySource::DataFile(name) | BodySource::Upload(name) if name == STDIN_NAME => {
            debug!("request body from standard input");
            Ok(RequestBody::Stream {
                reader: Box::pin(tokio::io::stdin()),
                length: None,
            })
        }
        BodySource::DataFile(name) | BodySource::Upload(name) => open_file(name).await,
    }
}

async fn open_file(name: &str) -> Result<RequestBody, AbortError> {
    let path = resolve_local_path(name);
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| AbortError::body_file(path.clone(), e))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| AbortError::body_file(path.clone(), e))?
        .len();
    debug!(path = %path.display(), bytes = length, "request body from file");
    Ok(RequestBody::Stream {
        reader: Box::pin(file),
        length: Some(length),
    })
}

fn resolve_local_path(name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
