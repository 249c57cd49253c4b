//! Response body streaming: count, optionally decode, write.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::RunError;

/// Stream adapter that counts every chunk before passing it on.
pub struct CountingStream<S> {
    inner: S,
    count: u64,
}

impl<S> CountingStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, count: 0 }
    }

    /// Bytes yielded so far.
    #[must_use]
    pub fn bytes_counted(&self) -> u64 {
        self.count
    }
}

impl<S> Stream for CountingStream<S>
where
    S: Stream<Item = Result<Bytes, io::Error>> + Unpin,
{
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.count += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}

/// Incremental UTF-8 decoder.
///
/// Multi-byte sequences split across chunks are carried over to the next
/// call; invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `chunk`, holding back a trailing incomplete sequence.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buffer = std::mem::take(&mut self.pending);
        buffer.extend_from_slice(chunk);

        let mut text = String::with_capacity(buffer.len());
        let mut rest = buffer.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match error.error_len() {
                        Some(invalid) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }

    /// Flushes a dangling incomplete sequence as U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

/// Where the body is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("standard output"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Result of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub destination: Destination,
    pub bytes_transferred: u64,
    /// Wall-clock time from just before the request was sent.
    pub elapsed: Duration,
}

impl TransferOutcome {
    /// The file written, if the body did not go to standard output.
    #[must_use]
    pub fn file_name(&self) -> Option<&Path> {
        match &self.destination {
            Destination::File(path) => Some(path),
            Destination::Stdout => None,
        }
    }

    /// Completion lines for stderr.
    ///
    /// Nothing under `silent`. The size/time line is skipped when the body
    /// went to an interactive terminal.
    #[must_use]
    pub fn report_lines(&self, silent: bool, out_is_terminal: bool) -> Vec<String> {
        if silent {
            return Vec::new();
        }
        let mut lines = Vec::with_capacity(2);
        if !(self.destination == Destination::Stdout && out_is_terminal) {
            lines.push(format!(
                "received {} bytes in {:.3}s",
                self.bytes_transferred,
                self.elapsed.as_secs_f64()
            ));
        }
        if let Some(path) = self.file_name() {
            lines.push(format!("saved to {}", path.display()));
        }
        lines
    }
}

/// Drains `body` into `writer` and returns the byte count.
///
/// With `decode_text`, chunks are written as lossily decoded UTF-8; otherwise
/// they are written unchanged. The count is always of received bytes.
///
/// # Errors
///
/// [`RunError::BodyRead`] when the body stream fails and
/// [`RunError::Write`] when the writer does.
pub async fn stream_body<S, W>(body: S, writer: &mut W, decode_text: bool) -> Result<u64, RunError>
where
    S: Stream<Item = Result<Bytes, io::Error>> + Unpin,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut stream = CountingStream::new(body);
    let mut decoder = decode_text.then(Utf8Decoder::new);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| RunError::BodyRead {
            bytes: stream.bytes_counted(),
            source,
        })?;
        trace!(bytes = chunk.len(), total = stream.bytes_counted(), "chunk received");
        let written = match decoder.as_mut() {
            Some(decoder) => writer.write_all(decoder.decode(&chunk).as_bytes()).await,
            None => writer.write_all(&chunk).await,
        };
        written.map_err(RunError::Write)?;
    }

    if let Some(decoder) = decoder.as_mut() {
        writer
            .write_all(decoder.finish().as_bytes())
            .await
            .map_err(RunError::Write)?;
    }
    writer.flush().await.map_err(RunError::Write)?;

    Ok(stream.bytes_counted())
}
