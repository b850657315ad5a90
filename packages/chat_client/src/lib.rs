//! Connection state machine and conversation store for the embedded chat
//! widget.
//!
//! One [`spawn_conversation`] call owns one transport connection for its
//! whole lifetime: it opens the WebSocket on spawn, decodes inbound frames
//! through `chat_wire`, publishes [`ConversationState`] on a watch channel,
//! and re-emits activity as typed [`ConversationEvent`]s. Reconnection after
//! an abnormal close is automatic on a fixed delay until
//! [`ConversationHandle::teardown`] is called.

mod audio;
mod composer;
mod config;
mod connection;
mod events;
mod session;
mod speech;
pub mod testing;
mod transport;

pub mod state;

pub use audio::PendingAudio;
pub use composer::Composer;
pub use config::{ChatClientConfig, DEFAULT_WEBSOCKET_URL, ReconnectPolicy};
pub use connection::{ConversationHandle, spawn_conversation};
pub use events::ConversationEvent;
pub use session::{generate_message_id, generate_session_id};
pub use speech::{CaptureEvent, SimulatedSpeechInput, SpeechInputProvider, UnsupportedSpeechInput};
pub use state::{ConversationState, Message, MessageKind, MessageMetadata, NavigationAction, NavigationKind, Sender};
pub use transport::{Connector, Transport, TransportError, TransportEvent, WebSocketConnector};
