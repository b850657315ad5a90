//! In-memory audio recording buffer.
//!
//! Accumulates chunks while a voice send is composed. A recording that grows
//! past the byte ceiling is discarded rather than sent, and the buffer is
//! always drained by the send attempt regardless of outcome.

use chat_wire::AudioClip;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct PendingAudio {
    chunks: Vec<u8>,
    mime_type: String,
    max_bytes: usize,
    overflowed: bool,
}

impl PendingAudio {
    pub fn new(mime_type: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            chunks: Vec::new(),
            mime_type: mime_type.into(),
            max_bytes,
            overflowed: false,
        }
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        if self.overflowed {
            return;
        }
        self.chunks.extend_from_slice(chunk);
        if self.chunks.len() > self.max_bytes {
            warn!(
                size = self.chunks.len(),
                max = self.max_bytes,
                "recording exceeded ceiling, discarding audio"
            );
            self.chunks.clear();
            self.overflowed = true;
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Drain the buffer into a clip for the send attempt.
    ///
    /// Returns `None` when nothing usable was recorded (empty or discarded
    /// as oversized); the text portion of the send proceeds either way.
    pub fn finish(&mut self) -> Option<AudioClip> {
        let overflowed = std::mem::take(&mut self.overflowed);
        let bytes = std::mem::take(&mut self.chunks);
        if overflowed || bytes.is_empty() {
            return None;
        }
        debug!(size = bytes.len(), mime_type = %self.mime_type, "recording complete");
        Some(AudioClip::new(bytes, self.mime_type.clone()))
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.overflowed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_yields_clip_and_drains() {
        let mut pending = PendingAudio::new("audio/webm", 100);
        pending.push_chunk(&[1, 2, 3]);
        pending.push_chunk(&[4]);
        let clip = pending.finish().unwrap();
        assert_eq!(clip.bytes, vec![1, 2, 3, 4]);
        assert_eq!(clip.mime_type, "audio/webm");
        assert!(pending.finish().is_none(), "second finish must be empty");
    }

    #[test]
    fn oversized_recording_is_discarded() {
        let mut pending = PendingAudio::new("audio/webm", 4);
        pending.push_chunk(&[0; 5]);
        assert!(pending.is_empty());
        assert!(pending.finish().is_none());
        // buffer is reusable after the failed attempt
        pending.push_chunk(&[9]);
        assert_eq!(pending.finish().unwrap().bytes, vec![9]);
    }

    #[test]
    fn chunks_after_overflow_are_ignored() {
        let mut pending = PendingAudio::new("audio/webm", 2);
        pending.push_chunk(&[0; 3]);
        pending.push_chunk(&[1]);
        assert!(pending.finish().is_none());
    }

    #[test]
    fn empty_buffer_finishes_to_none() {
        let mut pending = PendingAudio::new("audio/webm", 10);
        assert!(pending.finish().is_none());
    }
}
