//! Incremental newline-delimited decoder
//!
//! [`LineDecoder`] is the synchronous core: it buffers fragments and yields
//! complete candidate lines. [`LineStream`] drives it from an async fragment
//! source under an idle timeout.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::error::StreamError;

/// Prefix of a markdown code fence line
pub const FENCE_MARKER: &str = "```";

/// Counters collected while decoding one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Fragments received from the source
    pub fragments: usize,
    /// Candidate lines emitted
    pub lines: usize,
    /// Code fence lines dropped as formatting noise
    pub fence_lines: usize,
    /// Lines discarded for exceeding the line length cap
    pub oversized_lines: usize,
    pub time_to_first_fragment: Option<Duration>,
    pub time_to_first_line: Option<Duration>,
}

/// Splits a fragmented text stream into candidate lines.
///
/// Empty lines and code fences are dropped. Text after the last newline stays
/// buffered until more input arrives or [`finish`](Self::finish) flushes it.
/// A line longer than the configured cap is discarded up to its newline and
/// counted in [`DecodeStats::oversized_lines`]; the buffer never holds more
/// than the cap.
///
/// # Example
/// ```
/// use surface_dispatch_core::decoder::LineDecoder;
///
/// let mut decoder = LineDecoder::new();
/// assert!(decoder.push_str("{\"a\":").is_empty());
/// assert_eq!(decoder.push_str("1}\n```\n{\"b\""), vec!["{\"a\":1}"]);
/// assert_eq!(decoder.finish().as_deref(), Some("{\"b\""));
/// assert_eq!(decoder.stats().fence_lines, 1);
/// ```
#[derive(Debug)]
pub struct LineDecoder {
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending: Vec<u8>,
    max_line_bytes: usize,
    /// Dropping input until the end of an oversized line
    discarding: bool,
    stats: DecodeStats,
    started: Instant,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pending: Vec::new(),
            max_line_bytes: usize::MAX,
            discarding: false,
            stats: DecodeStats::default(),
            started: Instant::now(),
        }
    }

    /// Cap the length of a single line, in bytes.
    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.max_line_bytes = max;
        self
    }

    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Feed a text fragment; returns the lines it completed.
    pub fn push_str(&mut self, fragment: &str) -> Vec<String> {
        self.stats.fragments += 1;
        if self.stats.time_to_first_fragment.is_none() {
            self.stats.time_to_first_fragment = Some(self.started.elapsed());
        }
        // Only the new fragment can contain the next newline.
        let scan_from = self.buffer.len();
        self.buffer.push_str(fragment);

        let lines = match self.buffer[scan_from..].rfind('\n') {
            Some(offset) => {
                let rest = self.buffer.split_off(scan_from + offset + 1);
                let complete = std::mem::replace(&mut self.buffer, rest);
                let mut raw = complete.split('\n');
                if std::mem::take(&mut self.discarding) {
                    // Tail of an oversized line
                    raw.next();
                }
                raw.filter_map(|raw| self.accept(raw)).collect()
            }
            None => Vec::new(),
        };

        if self.discarding {
            self.buffer.clear();
        } else if self.buffer.len() > self.max_line_bytes {
            self.buffer.clear();
            self.discarding = true;
            self.overflow();
        }
        lines
    }

    /// Feed a byte fragment; UTF-8 sequences may be split across fragments.
    ///
    /// Invalid sequences are replaced with U+FFFD.
    pub fn push_bytes(&mut self, fragment: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(fragment);
        let mut text = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    text.push_str(valid);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    text.push_str(std::str::from_utf8(&self.pending[..valid_up_to]).unwrap_or_default());
                    match err.error_len() {
                        Some(invalid) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid_up_to + invalid);
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more bytes.
                            self.pending.drain(..valid_up_to);
                            break;
                        }
                    }
                }
            }
        }
        self.push_str(&text)
    }

    /// Flush the remaining buffer at stream end.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.buffer.push_str(&tail);
        }
        let rest = std::mem::take(&mut self.buffer);
        if std::mem::take(&mut self.discarding) {
            return None;
        }
        self.accept(&rest)
    }

    fn overflow(&mut self) {
        self.stats.oversized_lines += 1;
        warn!(max_line_bytes = self.max_line_bytes, "Discarding oversized line");
    }

    fn accept(&mut self, raw: &str) -> Option<String> {
        if raw.len() > self.max_line_bytes {
            self.overflow();
            return None;
        }
        let line = raw.trim();
        if line.is_empty() {
            return None;
        }
        if line.starts_with(FENCE_MARKER) {
            self.stats.fence_lines += 1;
            return None;
        }
        self.stats.lines += 1;
        if self.stats.time_to_first_line.is_none() {
            self.stats.time_to_first_line = Some(self.started.elapsed());
        }
        Some(line.to_string())
    }
}

/// Async line source over a fragment stream with an idle timeout.
///
/// After the first error (idle timeout or transport failure) or the natural
/// end of the source, no further lines are yielded.
pub struct LineStream<S> {
    source: Pin<Box<S>>,
    decoder: LineDecoder,
    ready: VecDeque<String>,
    idle: Duration,
    /// Terminal error to report once the ready lines are drained
    failure: Option<StreamError>,
    done: bool,
}

impl<S> fmt::Debug for LineStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineStream")
            .field("stats", &self.decoder.stats)
            .field("ready", &self.ready.len())
            .field("idle", &self.idle)
            .field("done", &self.done)
            .finish()
    }
}

impl<S, B, E> LineStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    /// Start decoding `source`.
    ///
    /// The idle timer starts with the first [`next_line`](Self::next_line)
    /// call that has to wait for input and restarts with every fragment.
    pub fn new(source: S, idle: Duration) -> Self {
        Self {
            source: Box::pin(source),
            decoder: LineDecoder::new(),
            ready: VecDeque::new(),
            idle,
            failure: None,
            done: false,
        }
    }

    /// End the stream with [`StreamError::LineTooLong`] when a line exceeds
    /// `max` bytes.
    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.decoder.max_line_bytes = max;
        self
    }

    pub fn stats(&self) -> &DecodeStats {
        self.decoder.stats()
    }

    /// Whether the source has ended or failed.
    pub fn is_finished(&self) -> bool {
        self.done && self.ready.is_empty() && self.failure.is_none()
    }

    fn line_too_long(&self) -> StreamError {
        warn!(max_line_bytes = self.decoder.max_line_bytes, "Line exceeds limit, ending stream");
        StreamError::LineTooLong {
            max_line_bytes: self.decoder.max_line_bytes,
            lines_decoded: self.decoder.stats().lines,
            messages_applied: 0,
        }
    }

    /// Next candidate line, a terminal error, or `None` once finished.
    pub async fn next_line(&mut self) -> Option<Result<String, StreamError>> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Some(Ok(line));
            }
            if let Some(failure) = self.failure.take() {
                return Some(Err(failure));
            }
            if self.done {
                return None;
            }

            match tokio::time::timeout(self.idle, self.source.next()).await {
                Err(_) => {
                    self.done = true;
                    let lines = self.decoder.stats().lines;
                    warn!(idle = ?self.idle, lines, "Stream idle timeout");
                    return Some(Err(StreamError::IdleTimeout {
                        idle: self.idle,
                        lines_decoded: lines,
                        messages_applied: 0,
                    }));
                }
                Ok(Some(Err(err))) => {
                    self.done = true;
                    warn!(error = %err, "Stream transport failed");
                    return Some(Err(StreamError::Transport(err.to_string())));
                }
                Ok(Some(Ok(fragment))) => {
                    let first_line = self.decoder.stats().lines == 0;
                    let oversized = self.decoder.stats().oversized_lines;
                    let lines = self.decoder.push_bytes(fragment.as_ref());
                    if self.decoder.stats().oversized_lines > oversized {
                        self.done = true;
                        self.failure = Some(self.line_too_long());
                    }
                    if self.decoder.stats().fragments == 1 {
                        info!(
                            elapsed = ?self.decoder.stats().time_to_first_fragment,
                            "First fragment received"
                        );
                    }
                    if first_line && !lines.is_empty() {
                        info!(
                            elapsed = ?self.decoder.stats().time_to_first_line,
                            "First line decoded"
                        );
                    }
                    self.ready.extend(lines);
                }
                Ok(None) => {
                    self.done = true;
                    let oversized = self.decoder.stats().oversized_lines;
                    if let Some(line) = self.decoder.finish() {
                        self.ready.push_back(line);
                    }
                    if self.decoder.stats().oversized_lines > oversized {
                        self.failure = Some(self.line_too_long());
                    }
                    let stats = self.decoder.stats();
                    debug!(
                        fragments = stats.fragments,
                        lines = stats.lines,
                        fence_lines = stats.fence_lines,
                        "Stream ended"
                    );
                    if stats.lines == 0 {
                        warn!(fragments = stats.fragments, "Stream produced no candidate lines");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    const INPUT: &str = "{\"a\":1}\n\n```json\n  {\"b\":2}  \n```\n{\"c\":3}";

    fn decode_all(fragments: &[&str]) -> Vec<String> {
        let mut decoder = LineDecoder::new();
        let mut out = Vec::new();
        for fragment in fragments {
            out.extend(decoder.push_str(fragment));
        }
        out.extend(decoder.finish());
        out
    }

    #[test]
    fn test_drops_blank_and_fence_lines() {
        let mut decoder = LineDecoder::new();
        let mut lines = decoder.push_str(INPUT);
        lines.extend(decoder.finish());
        assert_eq!(lines, vec!["{\"a\":1}", "{\"b\":2}", "{\"c\":3}"]);
        assert_eq!(decoder.stats().fence_lines, 2);
        assert_eq!(decoder.stats().lines, 3);
    }

    #[test]
    fn test_fragmentation_invariance() {
        let whole = decode_all(&[INPUT]);
        for size in 1..INPUT.len() {
            let chars: Vec<char> = INPUT.chars().collect();
            let pieces: Vec<String> = chars.chunks(size).map(|c| c.iter().collect()).collect();
            let refs: Vec<&str> = pieces.iter().map(String::as_str).collect();
            assert_eq!(decode_all(&refs), whole, "chunk size {size}");
        }
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(decode_all(&["{\"a\":1}\r\n{\"b\":2}\r\n"]), vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn test_split_utf8_sequence() {
        let text = "{\"t\":\"héllo ✓\"}\n";
        let bytes = text.as_bytes();
        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        for byte in bytes {
            lines.extend(decoder.push_bytes(std::slice::from_ref(byte)));
        }
        assert_eq!(lines, vec!["{\"t\":\"héllo ✓\"}"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push_bytes(b"a\xffb\n");
        assert_eq!(lines, vec!["a\u{FFFD}b"]);
    }

    #[test]
    fn test_finish_flushes_incomplete_bytes() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push_bytes(b"x\xe2\x9c").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("x\u{FFFD}"));
    }

    #[test]
    fn test_long_line_in_small_fragments() {
        let payload = format!("{{\"blob\":\"{}\"}}", "x".repeat(200_000));
        let text = format!("{payload}\n{{\"b\":2}}\n");
        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        for piece in text.as_bytes().chunks(4) {
            lines.extend(decoder.push_bytes(piece));
        }
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], payload);
        assert_eq!(decoder.stats().fragments, text.len().div_ceil(4));
    }

    #[test]
    fn test_oversized_line_is_discarded() {
        let mut decoder = LineDecoder::new().with_max_line_bytes(8);
        assert_eq!(decoder.push_str("{\"a\":1}\n{\"long"), vec!["{\"a\":1}"]);
        assert!(decoder.push_str("_key_value\":").is_empty());
        assert!(decoder.push_str("123}\n{\"b\"").is_empty());
        assert_eq!(decoder.push_str(":2}\n"), vec!["{\"b\":2}"]);
        assert_eq!(decoder.stats().oversized_lines, 1);

        // A complete oversized line inside one fragment is dropped too.
        assert_eq!(decoder.push_str("0123456789\nok\n"), vec!["ok"]);
        assert_eq!(decoder.stats().oversized_lines, 2);

        assert!(decoder.push_str("abcdefghij").is_empty());
        assert_eq!(decoder.finish(), None);
        assert_eq!(decoder.stats().oversized_lines, 3);
    }

    #[tokio::test]
    async fn test_oversized_line_ends_stream() {
        let source = tokio_stream::iter(vec![
            Ok::<_, Infallible>("{\"a\":1}\n{\"b\":"),
            Ok("\"0123456789\"}\n"),
            Ok("{\"c\":3}\n"),
        ]);
        let mut stream = LineStream::new(source, Duration::from_secs(1)).with_max_line_bytes(12);
        assert_eq!(stream.next_line().await, Some(Ok("{\"a\":1}".to_string())));
        assert_eq!(
            stream.next_line().await,
            Some(Err(StreamError::LineTooLong {
                max_line_bytes: 12,
                lines_decoded: 1,
                messages_applied: 0,
            }))
        );
        assert_eq!(stream.next_line().await, None);
        assert!(stream.is_finished());
    }

    #[tokio::test]
    async fn test_stream_yields_lines_then_none() {
        let source = tokio_stream::iter(vec![
            Ok::<_, Infallible>("{\"a\":1}\n{\"b\""),
            Ok(":2}"),
        ]);
        let mut stream = LineStream::new(source, Duration::from_secs(1));
        assert_eq!(stream.next_line().await, Some(Ok("{\"a\":1}".to_string())));
        assert_eq!(stream.next_line().await, Some(Ok("{\"b\":2}".to_string())));
        assert_eq!(stream.next_line().await, None);
        assert!(stream.is_finished());
        assert_eq!(stream.stats().fragments, 2);
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let source = tokio_stream::iter(vec![Ok("{\"a\":1}\n"), Err("connection reset"), Ok("{\"b\":2}\n")]);
        let mut stream = LineStream::new(source, Duration::from_secs(1));
        assert_eq!(stream.next_line().await, Some(Ok("{\"a\":1}".to_string())));
        assert_eq!(
            stream.next_line().await,
            Some(Err(StreamError::Transport("connection reset".into())))
        );
        assert_eq!(stream.next_line().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_ends_stream() {
        let (tx, rx) = mpsc::unbounded_channel::<Result<String, Infallible>>();
        let mut stream = LineStream::new(UnboundedReceiverStream::new(rx), Duration::from_millis(500));

        tx.send(Ok("{\"a\":1}\n".into())).unwrap();
        assert_eq!(stream.next_line().await, Some(Ok("{\"a\":1}".to_string())));

        // Nothing arrives; the paused clock advances to the deadline.
        let result = stream.next_line().await;
        assert_eq!(
            result,
            Some(Err(StreamError::IdleTimeout {
                idle: Duration::from_millis(500),
                lines_decoded: 1,
                messages_applied: 0,
            }))
        );

        // Late fragments are never decoded.
        tx.send(Ok("{\"b\":2}\n".into())).unwrap();
        assert_eq!(stream.next_line().await, None);
    }
}
