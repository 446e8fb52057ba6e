use tracing::{debug, warn};

use crate::types::Ask;

/// One decoded wire frame from the run stream.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Frame {
    /// Continuation of plain output for a logical path.
    Content { path: String, content: String },
    /// Mid-run request for user input.
    Ask(Ask),
}

/// Incremental decoder for the run stream's `data: <json>` framing.
///
/// Chunk boundaries are arbitrary: a line, and even a single JSON frame, may
/// span several chunks. Bytes are buffered until a full line arrives; `data:`
/// line payloads accumulate in a carry-over JSON buffer that is parsed once
/// the trimmed buffer ends with `}`. A truncation failure at that point just
/// means more lines are needed, so the buffer is retained and retried; an
/// unrepairable parse failure discards the buffer.
#[derive(Default)]
pub(crate) struct FrameDecoder {
    line_buf: Vec<u8>,
    json_buf: String,
}

impl FrameDecoder {
    /// Feeds one chunk of stream bytes and returns every frame it completes.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.line_buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(idx) = self.line_buf.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.line_buf.drain(..=idx).collect();
            let text = String::from_utf8_lossy(&line_bytes);
            let line = text.trim_end_matches(['\n', '\r']);
            if let Some(frame) = self.push_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn push_line(&mut self, line: &str) -> Option<Frame> {
        let payload = line.strip_prefix("data: ")?;
        self.json_buf.push_str(payload);
        // NOTE: the upstream wire format has no frame-length prefix, so a
        // trailing `}` is the only completeness signal. Content whose text
        // legitimately ends with `}` mid-frame can trigger an early parse
        // attempt; the retained buffer makes that attempt harmless.
        if !self.json_buf.trim_end().ends_with('}') {
            return None;
        }
        match serde_json::from_str::<serde_json::Value>(&self.json_buf) {
            Ok(value) => {
                self.json_buf.clear();
                classify_frame(value)
            }
            // Truncated JSON means the frame continues on a later line; any
            // other parse error can never be repaired by appending, and a
            // poisoned buffer would swallow every frame after it.
            Err(err) if err.is_eof() => {
                debug!(error = %err, "frame buffer not yet complete JSON, retaining");
                None
            }
            Err(err) => {
                warn!(error = %err, "discarding unparseable frame buffer");
                self.json_buf.clear();
                None
            }
        }
    }
}

/// Maps one parsed JSON frame to a [`Frame`], dropping protocol noise.
///
/// Empty-content frames are keep-alive noise and are ignored; a frame that is
/// valid JSON but has an unusable shape is logged and skipped so one bad
/// frame never aborts the run.
fn classify_frame(value: serde_json::Value) -> Option<Frame> {
    if value.get("type").and_then(|v| v.as_str()) == Some("ask") {
        return match serde_json::from_value::<Ask>(value) {
            Ok(ask) => Some(Frame::Ask(ask)),
            Err(err) => {
                warn!(error = %err, "skipping malformed ask frame");
                None
            }
        };
    }
    let path = value
        .get("path")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    match value.get("content").and_then(|v| v.as_str()) {
        Some(content) if !content.is_empty() => Some(Frame::Content {
            path,
            content: content.to_string(),
        }),
        Some(_) => None,
        None => {
            warn!("skipping frame without usable content");
            None
        }
    }
}
