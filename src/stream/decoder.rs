use tracing::debug;

use crate::models::StreamEvent;

/// Prefix of every payload line in the chat stream.
pub const DATA_PREFIX: &str = "data: ";

/// Longest line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental decoder for the newline-delimited `data: {json}` chat stream.
///
/// Bytes are buffered until a `\n` arrives, so a line (or a multi-byte UTF-8
/// character) split across transport chunks is reassembled before parsing.
/// A line outgrowing the cap is dropped as malformed up to its newline.
#[derive(Debug)]
pub struct SseLineDecoder {
    pending: Vec<u8>,
    malformed: usize,
    max_line: usize,
    overflowed: bool,
}

impl Default for SseLineDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self { pending: Vec::new(), malformed: 0, max_line, overflowed: false }
    }

    /// Feeds one transport chunk and returns every event completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut chunk = chunk;
        if self.overflowed {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.overflowed = false;
                    chunk = &chunk[end + 1..];
                }
                None => return Vec::new(),
            }
        }
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let line = String::from_utf8_lossy(&self.pending[start..end]).into_owned();
            if let Some(event) = self.decode_line(&line) {
                events.push(event);
            }
            start = end + 1;
        }
        self.pending.drain(..start);

        if self.pending.len() > self.max_line {
            debug!("Dropping stream line longer than {} bytes", self.max_line);
            self.pending.clear();
            self.overflowed = true;
            self.malformed += 1;
        }
        events
    }

    /// Flushes the trailing line left without a newline at end of body.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        self.overflowed = false;
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&rest).into_owned();
        self.decode_line(&line)
    }

    /// Number of `data:` payloads dropped because they were not valid events.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    fn decode_line(&mut self, line: &str) -> Option<StreamEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let payload = line.strip_prefix(DATA_PREFIX)?.trim();
        if payload.is_empty() {
            return None;
        }
        match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                self.malformed += 1;
                debug!("Dropping malformed stream fragment ({e}): {payload}");
                None
            }
        }
    }
}
