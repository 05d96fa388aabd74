//! Newline-delimited text framing for stream sockets.

use std::io::{self, BufRead};

use super::TransportError;

const DELIMITER: u8 = b'\n';

/// Appends the frame delimiter to `text`.
///
/// Payloads containing a line break are rejected because the peer would see
/// them as two frames.
pub(super) fn encode(text: &str) -> Result<String, TransportError> {
    if text.contains(['\n', '\r']) {
        return Err(TransportError::EmbeddedNewline);
    }
    let mut frame = String::with_capacity(text.len() + 1);
    frame.push_str(text);
    frame.push(char::from(DELIMITER));
    Ok(frame)
}

/// Splits a byte stream into text frames.
pub(super) struct FrameReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> FrameReader<R> {
    pub(super) const fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    /// Returns the next non-blank frame, or `None` at end of stream.
    ///
    /// A trailing `\r` is trimmed. Invalid UTF-8 is replaced rather than
    /// rejected so that one bad frame does not end the connection.
    pub(super) fn next_frame(&mut self) -> io::Result<Option<String>> {
        loop {
            self.buffer.clear();
            if self.inner.read_until(DELIMITER, &mut self.buffer)? == 0 {
                return Ok(None);
            }
            let text = String::from_utf8_lossy(&self.buffer);
            let frame = text.trim_end_matches(['\n', '\r']);
            if frame.trim().is_empty() {
                continue;
            }
            return Ok(Some(frame.to_owned()));
        }
    }
}
