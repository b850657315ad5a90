use serde::{Deserialize, Serialize};

/// A raw audio recording captured while a send was composed.
///
/// Held in memory only; the codec turns it into an [`AudioPayload`] at
/// encode time (or drops it, see `encode_outbound`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Base64 audio attachment as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPayload {
    /// Base64-encoded audio bytes (standard alphabet, padded).
    pub data: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Original byte size before encoding.
    pub size: u64,
}

/// Frames the client sends to the conversation service.
///
/// Wire shape: `{"type":"message","content":…,"sessionId":…,"audio":{…}?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Message {
        content: String,
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        audio: Option<AudioPayload>,
    },
}

/// A recognized assistant response frame.
///
/// Wire shape: `{"type":"response","content":…,"timestamp"?,"messageCount"?}`.
/// Extra navigation fields are optional; most responses carry none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundResponse {
    pub content: String,
    /// Server timestamp in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Server-side message sequence number.
    #[serde(rename = "messageCount", default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<u64>,
    #[serde(rename = "navigationTarget", default, skip_serializing_if = "Option::is_none")]
    pub navigation_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frame_message_serde() {
        let frame = ClientFrame::Message {
            content: "where is billing?".to_string(),
            session_id: "chat-session-1-abc".to_string(),
            audio: None,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["content"], "where is billing?");
        assert_eq!(json["sessionId"], "chat-session-1-abc");
        // absent audio must not serialize as null
        assert!(json.get("audio").is_none());
    }

    #[test]
    fn client_frame_audio_field_shape() {
        let frame = ClientFrame::Message {
            content: "hi".to_string(),
            session_id: "s".to_string(),
            audio: Some(AudioPayload {
                data: "AAEC".to_string(),
                mime_type: "audio/webm;codecs=opus".to_string(),
                size: 3,
            }),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["audio"]["data"], "AAEC");
        assert_eq!(json["audio"]["mimeType"], "audio/webm;codecs=opus");
        assert_eq!(json["audio"]["size"], 3);
    }

    #[test]
    fn inbound_response_optional_fields() {
        let resp: InboundResponse =
            serde_json::from_str(r#"{"content":"The billing page is under Settings."}"#).unwrap();
        assert!(resp.timestamp.is_none());
        assert!(resp.message_count.is_none());
        assert!(resp.navigation_target.is_none());

        let resp: InboundResponse = serde_json::from_str(
            r#"{"content":"ok","timestamp":1700000000000,"messageCount":4,"navigationTarget":"/billing"}"#,
        )
        .unwrap();
        assert_eq!(resp.timestamp, Some(1_700_000_000_000));
        assert_eq!(resp.message_count, Some(4));
        assert_eq!(resp.navigation_target.as_deref(), Some("/billing"));
    }
}
