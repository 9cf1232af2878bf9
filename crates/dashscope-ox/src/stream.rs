//! Reassembly of streamed chat completions.
//!
//! A streamed response is a sequence of server-sent-event lines, each carrying
//! a JSON chunk with an incremental `choices[0].delta.content` fragment, ended
//! by `data: [DONE]`. Folding the fragments in arrival order yields the full
//! answer. Lines that fail to decode are logged and skipped; a stream that ends
//! without `[DONE]` is treated as complete.

use ai_ox_common::{BoxStream, LineReader, SseLine, snippet};
use futures_util::StreamExt;
use tracing::warn;

use crate::{error::DashScopeRequestError, response::ChatCompletionChunk};

/// Characters of an undecodable line kept in the warning
const SNIPPET_CHARS: usize = 50;

/// What one line contributes to the answer
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Skip,
    Fragment(String),
    Done,
}

fn decode_line(line: &[u8]) -> Result<Step, DashScopeRequestError> {
    let line = std::str::from_utf8(line).map_err(|e| {
        DashScopeRequestError::MalformedStreamChunk(format!(
            "invalid UTF-8 ({e}): {}",
            snippet(&String::from_utf8_lossy(line), SNIPPET_CHARS)
        ))
    })?;

    match SseLine::parse(line) {
        SseLine::Blank | SseLine::Comment => Ok(Step::Skip),
        SseLine::Done => Ok(Step::Done),
        SseLine::Data(data) => {
            let chunk: ChatCompletionChunk = serde_json::from_str(data).map_err(|e| {
                DashScopeRequestError::MalformedStreamChunk(format!(
                    "{e}: {}",
                    snippet(data, SNIPPET_CHARS)
                ))
            })?;
            Ok(chunk
                .delta_text()
                .map_or(Step::Skip, |text| Step::Fragment(text.to_string())))
        }
    }
}

/// Decode a line, logging and skipping it when it is malformed
fn step(line: &[u8]) -> Step {
    decode_line(line).unwrap_or_else(|err| {
        warn!(error = %err, "skipping undecodable stream line");
        Step::Skip
    })
}

/// Lazy iterator over the text fragments of a line sequence.
///
/// Stops at `[DONE]`; lines after the sentinel are never pulled.
pub struct Fragments<I> {
    lines: I,
    done: bool,
}

impl<I, L> Iterator for Fragments<I>
where
    I: Iterator<Item = L>,
    L: AsRef<[u8]>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while !self.done {
            let line = self.lines.next()?;
            match step(line.as_ref()) {
                Step::Fragment(text) => return Some(text),
                Step::Done => self.done = true,
                Step::Skip => {}
            }
        }
        None
    }
}

pub fn fragments<I>(lines: I) -> Fragments<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    Fragments {
        lines: lines.into_iter(),
        done: false,
    }
}

/// Fold a complete line sequence into the answer text
pub fn reassemble<I>(lines: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    fragments(lines).collect()
}

/// Pull fragments from a streamed body as they arrive.
///
/// Read errors from the underlying body end the stream with that error.
pub fn fragment_stream<E>(mut lines: LineReader<E>) -> BoxStream<'static, Result<String, E>>
where
    E: Send + 'static,
{
    Box::pin(async_stream::try_stream! {
        while let Some(line) = lines.next_line().await? {
            match step(&line) {
                Step::Fragment(text) => yield text,
                Step::Done => break,
                Step::Skip => {}
            }
        }
    })
}

/// Read a streamed HTTP body to the end and return the reassembled text
pub(crate) async fn reassemble_response(
    response: reqwest::Response,
) -> Result<String, DashScopeRequestError> {
    let mut fragments = fragment_stream(LineReader::from_response(response));
    let mut text = String::new();
    while let Some(fragment) = fragments.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}
