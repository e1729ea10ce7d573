//! Text event-stream framing and notification decoding.

use crate::domain::entities::NotificationEvent;
use crate::domain::errors::{StreamError, StreamResult};
use crate::domain::ports::StreamFrame;

use super::constants::{EVENT_COUNT_UPDATE, EVENT_DEFAULT, EVENT_NOTIFICATION, MAX_PENDING_BYTES};

const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Incremental decoder that turns raw stream bytes into frames.
///
/// Chunks may split frames, lines, or multi-byte characters anywhere; bytes
/// are buffered until a blank line completes a frame. Bytes already searched
/// for a delimiter are not searched again.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    scanned: usize,
    limit: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_limit(MAX_PENDING_BYTES)
    }
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates decoder that tolerates at most `limit` bytes of unfinished frame.
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            limit,
        }
    }

    /// Feeds a chunk and returns every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.next_delimiter() {
            let block: Vec<u8> = self.buffer.drain(..end + FRAME_DELIMITER.len()).collect();
            self.scanned = 0;
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&block[..end])) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Fails once the unfinished frame outgrows the limit, discarding it.
    ///
    /// # Errors
    /// Returns [`StreamError::Protocol`] if too many bytes arrived without a
    /// blank line.
    pub fn check_pending(&mut self) -> StreamResult<()> {
        if self.buffer.len() <= self.limit {
            return Ok(());
        }

        let pending = self.buffer.len();
        self.buffer.clear();
        self.scanned = 0;
        Err(StreamError::protocol(format!(
            "{pending} bytes without a frame boundary (limit {})",
            self.limit
        )))
    }

    /// Returns whether a partial frame is buffered.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn next_delimiter(&mut self) -> Option<usize> {
        // A delimiter may straddle the previously scanned tail.
        let from = self.scanned.saturating_sub(FRAME_DELIMITER.len() - 1);
        let found = self.buffer[from..]
            .windows(FRAME_DELIMITER.len())
            .position(|w| w == FRAME_DELIMITER)
            .map(|offset| from + offset);

        if found.is_none() {
            self.scanned = self.buffer.len();
        }
        found
    }
}

/// Parses one blank-line-terminated block.
///
/// Returns `None` for blocks without data, such as keep-alive comments.
#[must_use]
pub fn parse_frame(block: &str) -> Option<StreamFrame> {
    let mut frame = StreamFrame::default();
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => frame.event = Some(value.to_string()),
            "data" => data.push(value),
            "id" => frame.id = Some(value.to_string()),
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }

    frame.data = data.join("\n");
    Some(frame)
}

/// Decodes a frame carrying a notification payload.
///
/// Frames for other event names yield `Ok(None)`.
///
/// # Errors
/// Returns [`StreamError::Decode`] if the payload is not a valid notification event.
pub fn decode_event(frame: &StreamFrame) -> Result<Option<NotificationEvent>, StreamError> {
    match frame.event_name() {
        EVENT_DEFAULT | EVENT_NOTIFICATION | EVENT_COUNT_UPDATE => {
            serde_json::from_str(&frame.data)
                .map(Some)
                .map_err(|e| StreamError::decode(e.to_string()))
        }
        _ => Ok(None),
    }
}
