use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};

use crate::frame::{AudioClip, AudioPayload, ClientFrame, InboundResponse};

/// Audio attachments above this byte count are dropped from the outbound
/// frame rather than risking a 1009 close for the whole send.
pub const DEFAULT_MAX_AUDIO_BYTES: usize = 50_000;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to serialize outbound frame")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to parse server response")]
    Parse(#[source] serde_json::Error),
}

/// Serialize one outbound user message.
///
/// `content` is expected to be trimmed and non-empty; the send path rejects
/// empty input before it reaches the codec. A missing, empty, or oversized
/// audio clip degrades the frame to text-only; losing the attachment must
/// never block the text message.
pub fn encode_outbound(
    content: &str,
    session_id: &str,
    audio: Option<&AudioClip>,
    max_audio_bytes: usize,
) -> Result<String, CodecError> {
    let audio = audio.and_then(|clip| attach_audio(clip, max_audio_bytes));
    let frame = ClientFrame::Message {
        content: content.to_string(),
        session_id: session_id.to_string(),
        audio,
    };
    serde_json::to_string(&frame).map_err(CodecError::Serialize)
}

fn attach_audio(clip: &AudioClip, max_audio_bytes: usize) -> Option<AudioPayload> {
    if clip.bytes.is_empty() {
        warn!("audio clip has no readable bytes, sending text only");
        return None;
    }
    if clip.size() > max_audio_bytes {
        warn!(
            size = clip.size(),
            max = max_audio_bytes,
            "audio clip too large, sending text only"
        );
        return None;
    }
    debug!(size = clip.size(), mime_type = %clip.mime_type, "including audio attachment");
    Some(AudioPayload {
        data: BASE64.encode(&clip.bytes),
        mime_type: clip.mime_type.clone(),
        size: clip.size() as u64,
    })
}

/// Parse one inbound frame.
///
/// Returns `Ok(Some(_))` for a well-formed assistant response, `Ok(None)`
/// for valid JSON of any other shape (ignored, logged), and `Err` when the
/// payload is not JSON at all. The connection stays open in every case;
/// decode outcomes are never fatal.
pub fn decode_inbound(raw: &str) -> Result<Option<InboundResponse>, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(DecodeError::Parse)?;

    match value.get("type").and_then(|v| v.as_str()) {
        Some("response") => match serde_json::from_value::<InboundResponse>(value) {
            Ok(resp) => Ok(Some(resp)),
            Err(e) => {
                warn!(error = %e, "malformed response frame, skipping");
                Ok(None)
            }
        },
        other => {
            debug!(frame_type = ?other, "unrecognized inbound frame, skipping");
            Ok(None)
        }
    }
}
