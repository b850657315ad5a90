//! Speech input as a capability, not an ambient global.
//!
//! The widget selects a provider at construction time: hosts with a native
//! recognizer adapt it behind [`SpeechInputProvider`]; everyone else gets
//! [`UnsupportedSpeechInput`] or the demo-mode [`SimulatedSpeechInput`] that
//! mirrors the original widget's word-by-word fallback transcript.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

/// Events produced by one capture session, ending with `Ended`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Partial transcript, shown as a live overlay, replaced by later events.
    Interim(String),
    /// Finalized transcript text to append to the draft.
    Final(String),
    /// Raw recorded audio bytes for the pending-audio buffer.
    Audio(Vec<u8>),
    Ended,
}

pub trait SpeechInputProvider: Send + Sync {
    fn is_available(&self) -> bool;

    /// Begin a capture session. Events arrive on the returned channel until
    /// [`CaptureEvent::Ended`]; dropping the receiver cancels the session.
    fn start(&self) -> mpsc::Receiver<CaptureEvent>;
}

/// No recognizer on this host. `start` ends immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSpeechInput;

impl SpeechInputProvider for UnsupportedSpeechInput {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&self) -> mpsc::Receiver<CaptureEvent> {
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            let _ = tx.send(CaptureEvent::Ended).await;
        });
        rx
    }
}

/// Demo-mode provider: emits a canned transcript one word at a time with a
/// small synthetic audio chunk per word.
#[derive(Debug, Clone)]
pub struct SimulatedSpeechInput {
    pub script: String,
    pub word_interval: Duration,
}

impl Default for SimulatedSpeechInput {
    fn default() -> Self {
        Self {
            script: "Hello, this is a test of the voice recognition feature".to_string(),
            word_interval: Duration::from_millis(300),
        }
    }
}

impl SimulatedSpeechInput {
    /// Same script, no inter-word delay. Handy in tests.
    pub fn immediate(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            word_interval: Duration::ZERO,
        }
    }
}

impl SpeechInputProvider for SimulatedSpeechInput {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&self) -> mpsc::Receiver<CaptureEvent> {
        let (tx, rx) = mpsc::channel(16);
        let script = self.script.clone();
        let interval = self.word_interval;
        tokio::spawn(async move {
            debug!("simulated speech capture started");
            let words: Vec<&str> = script.split_whitespace().collect();
            let mut spoken = String::new();
            for word in &words {
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                if !spoken.is_empty() {
                    spoken.push(' ');
                }
                spoken.push_str(word);
                if tx.send(CaptureEvent::Interim(spoken.clone())).await.is_err() {
                    return;
                }
                if tx.send(CaptureEvent::Audio(word.as_bytes().to_vec())).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(CaptureEvent::Final(spoken)).await;
            let _ = tx.send(CaptureEvent::Ended).await;
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_capture_finalizes_full_script() {
        let provider = SimulatedSpeechInput::immediate("where is billing");
        assert!(provider.is_available());
        let mut rx = provider.start();

        let mut finals = Vec::new();
        let mut audio_bytes = 0usize;
        while let Some(event) = rx.recv().await {
            match event {
                CaptureEvent::Final(text) => finals.push(text),
                CaptureEvent::Audio(chunk) => audio_bytes += chunk.len(),
                CaptureEvent::Interim(_) => {}
                CaptureEvent::Ended => break,
            }
        }
        assert_eq!(finals, vec!["where is billing".to_string()]);
        assert!(audio_bytes > 0, "simulation must record some audio");
    }

    #[tokio::test]
    async fn unsupported_capture_ends_immediately() {
        let provider = UnsupportedSpeechInput;
        assert!(!provider.is_available());
        let mut rx = provider.start();
        assert_eq!(rx.recv().await, Some(CaptureEvent::Ended));
        assert_eq!(rx.recv().await, None);
    }
}
