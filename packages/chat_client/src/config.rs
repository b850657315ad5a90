//! Explicit construction-time configuration.
//!
//! No component reads ambient global state; everything tunable arrives
//! through [`ChatClientConfig`] when the conversation is spawned.

use std::time::Duration;

use chat_wire::DEFAULT_MAX_AUDIO_BYTES;

pub const DEFAULT_WEBSOCKET_URL: &str = "ws://localhost:8081/ws/chat";

/// Recovery behavior after an abnormal close.
///
/// The observed widget behavior is a fixed 3-second delay retried forever;
/// deployments that want a cap opt in via `max_attempts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    /// Cap on consecutive automatic reconnects. `None` retries indefinitely;
    /// the counter resets every time a connection opens.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Never reconnect automatically. Useful for hosts that drive recovery
    /// themselves.
    pub fn disabled() -> Self {
        Self {
            delay: Duration::from_secs(3),
            max_attempts: Some(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatClientConfig {
    pub websocket_url: String,
    /// Preset session identifier. When `None` one is generated on the first
    /// send and kept for the lifetime of the store.
    pub session_id: Option<String>,
    pub reconnect: ReconnectPolicy,
    /// Audio attachments above this byte count are sent as text only.
    pub max_audio_bytes: usize,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            websocket_url: DEFAULT_WEBSOCKET_URL.to_string(),
            session_id: None,
            reconnect: ReconnectPolicy::default(),
            max_audio_bytes: DEFAULT_MAX_AUDIO_BYTES,
        }
    }
}

impl ChatClientConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            websocket_url: url.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_widget_behavior() {
        let cfg = ChatClientConfig::default();
        assert_eq!(cfg.websocket_url, "ws://localhost:8081/ws/chat");
        assert_eq!(cfg.reconnect.delay, Duration::from_secs(3));
        assert_eq!(cfg.reconnect.max_attempts, None);
        assert_eq!(cfg.max_audio_bytes, 50_000);
        assert!(cfg.session_id.is_none());
    }

    #[test]
    fn disabled_policy_caps_at_zero() {
        assert_eq!(ReconnectPolicy::disabled().max_attempts, Some(0));
    }
}
