// src/multiplex/lines.rs

//! Byte-stream to line splitting for one child pipe.

/// Accumulates raw bytes from a single stream and yields complete lines.
///
/// - Lines end at `\n`; one trailing `\r` is stripped.
/// - Exactly-empty lines are skipped; whitespace-only lines are kept.
/// - An unterminated trailing fragment is held until more bytes arrive or
///   [`LineSplitter::finish`] is called at EOF.
///
/// Splitting happens on bytes before decoding, so a multi-byte UTF-8
/// character split across two reads is reassembled correctly. Invalid UTF-8
/// is decoded lossily.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let mut line = &self.pending[start..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            if !line.is_empty() {
                lines.push(String::from_utf8_lossy(line).into_owned());
            }
            start = end + 1;
        }
        self.pending.drain(..start);

        lines
    }

    /// Number of buffered bytes not yet terminated by a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Flush the trailing fragment at EOF.
    ///
    /// Returns the fragment trimmed of surrounding whitespace, or `None` if
    /// nothing but whitespace was left (including the case where the stream
    /// ended exactly on a line terminator).
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&rest);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
