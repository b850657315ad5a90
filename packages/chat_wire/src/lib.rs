//! Wire codec for the chat widget's conversation protocol.
//!
//! One JSON frame per WebSocket text message. Outbound user messages carry
//! trimmed text, the session identifier, and an optional base64 audio
//! attachment; inbound frames are assistant responses. Everything here is
//! stateless; connection lifecycle lives in `chat_client`.

mod close;
mod codec;
mod frame;

pub use close::{MESSAGE_TOO_LARGE, NORMAL_CLOSURE, close_reason_message, should_reconnect};
pub use codec::{CodecError, DEFAULT_MAX_AUDIO_BYTES, DecodeError, decode_inbound, encode_outbound};
pub use frame::{AudioClip, AudioPayload, ClientFrame, InboundResponse};
