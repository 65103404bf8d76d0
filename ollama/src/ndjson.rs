//! Incremental newline-delimited JSON decoding.

use crate::error::TransportError;
use crate::types::StreamChunk;

/// Buffers raw body bytes and hands out complete lines.
///
/// Bytes are kept undecoded until a full line is available, so a multi-byte
/// UTF-8 sequence split across two network chunks is reassembled correctly.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of body bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Take the next complete line, without its terminator.
    ///
    /// Returns `None` while only a partial line is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Drain whatever is left once the body has ended.
    ///
    /// A final record is allowed to omit its trailing newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    /// Decode one line. Blank lines yield `Ok(None)`.
    pub fn parse_line(line: &str) -> Result<Option<StreamChunk>, TransportError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|source| TransportError::Parse {
                line: trimmed.to_string(),
                source,
            })
    }
}
