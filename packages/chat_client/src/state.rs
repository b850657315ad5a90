//! Observable conversation state and message types.
//!
//! The store is append-only: messages are never mutated or removed once
//! pushed, and insertion order is display order. Only the connection actor
//! writes to it; everything else observes through the watch channel.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use chat_wire::InboundResponse;

use crate::session::generate_message_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Voice,
    Navigation,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// One conversation entry. Immutable once appended to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Client-generated for user messages, client-generated at decode time
    /// for assistant messages (the server sequence surfaces separately as
    /// `message_count`).
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(rename = "messageCount", skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// Build the optimistic user entry for a send. `content` must already be
    /// trimmed.
    pub fn user(content: &str, voice: bool) -> Self {
        Self {
            id: generate_message_id(),
            content: content.to_string(),
            sender: Sender::User,
            timestamp: Utc::now(),
            kind: if voice { MessageKind::Voice } else { MessageKind::Text },
            message_count: None,
            metadata: None,
        }
    }

    /// Map a decoded response frame to an assistant entry.
    pub fn assistant(resp: &InboundResponse) -> Self {
        let timestamp = resp
            .timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);
        Self {
            id: generate_message_id(),
            content: resp.content.clone(),
            sender: Sender::Assistant,
            timestamp,
            kind: MessageKind::Text,
            message_count: resp.message_count,
            metadata: Some(MessageMetadata {
                navigation_target: resp.navigation_target.clone(),
                confidence: Some(1.0),
                suggestions: resp.suggestions.clone(),
            }),
        }
    }

    /// The navigation action this message carries, if its metadata names a
    /// target.
    pub fn navigation_action(&self) -> Option<NavigationAction> {
        let metadata = self.metadata.as_ref()?;
        let target = metadata.navigation_target.clone()?;
        Some(NavigationAction {
            kind: NavigationKind::Navigate,
            target,
            data: serde_json::to_value(metadata).ok(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    Navigate,
    Scroll,
    Highlight,
    Focus,
}

/// A page action suggested by an assistant message, re-emitted by the host
/// bridge as a `navigation-action` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationAction {
    #[serde(rename = "type")]
    pub kind: NavigationKind,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Snapshot published on the store's watch channel.
///
/// `is_loading` holds from send-issued until an assistant message is
/// appended or an error/close is observed; it is never left true on a
/// closed connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_connected: bool,
    pub session_id: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> InboundResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn assistant_message_maps_wire_fields() {
        let resp = response(r#"{"content":"ok","timestamp":1700000000000,"messageCount":7}"#);
        let msg = Message::assistant(&resp);
        assert_eq!(msg.sender, Sender::Assistant);
        assert_eq!(msg.content, "ok");
        assert_eq!(msg.message_count, Some(7));
        assert_eq!(msg.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(msg.metadata.as_ref().unwrap().confidence, Some(1.0));
    }

    #[test]
    fn assistant_message_without_timestamp_uses_now() {
        let before = Utc::now();
        let msg = Message::assistant(&response(r#"{"content":"hi"}"#));
        assert!(msg.timestamp >= before);
    }

    #[test]
    fn user_message_kind_tracks_audio() {
        assert_eq!(Message::user("hi", false).kind, MessageKind::Text);
        assert_eq!(Message::user("hi", true).kind, MessageKind::Voice);
    }

    #[test]
    fn navigation_action_requires_target() {
        let plain = Message::assistant(&response(r#"{"content":"hi"}"#));
        assert!(plain.navigation_action().is_none());

        let nav = Message::assistant(&response(
            r#"{"content":"Taking you there","navigationTarget":"/billing"}"#,
        ));
        let action = nav.navigation_action().unwrap();
        assert_eq!(action.kind, NavigationKind::Navigate);
        assert_eq!(action.target, "/billing");
    }

    #[test]
    fn message_serializes_with_wire_names() {
        let msg = Message::user("hello", false);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "user");
        assert_eq!(json["type"], "text");
        assert!(json.get("messageCount").is_none());
    }
}
