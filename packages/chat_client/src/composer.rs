//! Draft composition: typed text plus optional voice capture.
//!
//! Owns the draft string, the speech provider, and the pending-audio buffer.
//! A send hands the trimmed draft and whatever audio was recorded to the
//! conversation handle, then resets. The audio buffer is drained by every
//! send attempt regardless of outcome.

use tracing::debug;

use crate::audio::PendingAudio;
use crate::connection::ConversationHandle;
use crate::speech::{CaptureEvent, SpeechInputProvider};

const DEFAULT_MAX_DRAFT_CHARS: usize = 1000;
const DEFAULT_CAPTURE_MIME_TYPE: &str = "audio/webm;codecs=opus";

pub struct Composer {
    draft: String,
    /// Live interim transcript shown while capturing; not yet part of the
    /// draft.
    interim: String,
    max_chars: usize,
    pending_audio: PendingAudio,
    speech: Box<dyn SpeechInputProvider>,
}

impl Composer {
    pub fn new(speech: Box<dyn SpeechInputProvider>, max_audio_bytes: usize) -> Self {
        Self {
            draft: String::new(),
            interim: String::new(),
            max_chars: DEFAULT_MAX_DRAFT_CHARS,
            pending_audio: PendingAudio::new(DEFAULT_CAPTURE_MIME_TYPE, max_audio_bytes),
            speech,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn interim_transcript(&self) -> &str {
        &self.interim
    }

    pub fn has_pending_audio(&self) -> bool {
        !self.pending_audio.is_empty()
    }

    pub fn voice_input_available(&self) -> bool {
        self.speech.is_available()
    }

    /// Append typed text, clamped to the draft length ceiling.
    pub fn push_str(&mut self, text: &str) {
        for ch in text.chars() {
            if self.draft.chars().count() >= self.max_chars {
                break;
            }
            self.draft.push(ch);
        }
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft.clear();
        self.push_str(text);
    }

    /// Run one voice capture session to completion: interim transcript is
    /// kept visible while it runs, finalized text lands in the draft, and
    /// recorded audio accumulates for the next send.
    pub async fn capture_voice(&mut self) {
        let mut rx = self.speech.start();
        while let Some(event) = rx.recv().await {
            match event {
                CaptureEvent::Interim(text) => self.interim = text,
                CaptureEvent::Final(text) => {
                    self.interim.clear();
                    self.push_str(&text);
                }
                CaptureEvent::Audio(chunk) => self.pending_audio.push_chunk(&chunk),
                CaptureEvent::Ended => break,
            }
        }
        self.interim.clear();
        debug!(draft_len = self.draft.len(), audio_len = self.pending_audio.len(), "voice capture ended");
    }

    /// Send the current draft through the conversation handle.
    ///
    /// A whitespace-only draft still drains the audio buffer but sends
    /// nothing (the handle treats empty content as a no-op anyway).
    pub async fn send(&mut self, handle: &ConversationHandle) {
        let content = std::mem::take(&mut self.draft);
        let audio = self.pending_audio.finish();
        if content.trim().is_empty() {
            return;
        }
        handle.send_message(content, audio).await;
    }
}
