use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};

/// Boxed byte stream as produced by `reqwest::Response::bytes_stream`
type ByteStream<E> = Pin<Box<dyn Stream<Item = Result<Bytes, E>> + Send>>;

/// Splits a streamed HTTP body into lines.
///
/// The network may cut a line anywhere, so bytes are buffered until a `\n`
/// arrives. Line terminators (`\n` or `\r\n`) are not part of the returned line.
/// Whatever is left in the buffer when the body ends is returned as a final line.
pub struct LineReader<E> {
    byte_stream: ByteStream<E>,
    buffer: Vec<u8>,
    exhausted: bool,
}

impl LineReader<reqwest::Error> {
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream())
    }
}

impl<E> LineReader<E> {
    pub fn new(byte_stream: impl Stream<Item = Result<Bytes, E>> + Send + 'static) -> Self {
        Self {
            byte_stream: Box::pin(byte_stream),
            buffer: Vec::new(),
            exhausted: false,
        }
    }

    /// Get the next line from the body, or `None` once it has been fully read
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>, E> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
                line.pop();
                strip_carriage_return(&mut line);
                return Ok(Some(line));
            }

            if self.exhausted {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let mut line = std::mem::take(&mut self.buffer);
                strip_carriage_return(&mut line);
                return Ok(Some(line));
            }

            match self.byte_stream.next().await {
                Some(chunk) => self.buffer.extend_from_slice(&chunk?),
                None => self.exhausted = true,
            }
        }
    }

    /// Turn the reader into a pull-based stream of lines
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<u8>, E>> + Send
    where
        E: Send + 'static,
    {
        stream::unfold(Some(self), |reader| async move {
            let mut reader = reader?;
            match reader.next_line().await {
                Ok(Some(line)) => Some((Ok(line), Some(reader))),
                Ok(None) => None,
                // A read error ends the stream after it is reported.
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

/// Drop a trailing `\r` left over from a `\r\n` terminator
fn strip_carriage_return(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
}

/// Classification of one server-sent-event line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Empty line or a `data:` field with nothing after it
    Blank,
    /// `:` comment, typically a keep-alive
    Comment,
    /// The `[DONE]` end-of-stream sentinel
    Done,
    /// Payload with any `data:` prefix removed
    Data(&'a str),
}

impl<'a> SseLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        if line.trim().is_empty() {
            return SseLine::Blank;
        }

        if line.starts_with(':') {
            return SseLine::Comment;
        }

        let payload = line
            .strip_prefix("data:")
            .map_or(line, str::trim_start)
            .trim_end();

        match payload {
            "" => SseLine::Blank,
            "[DONE]" => SseLine::Done,
            data => SseLine::Data(data),
        }
    }
}
