//! Typed activity events.
//!
//! The connection actor broadcasts these instead of invoking callbacks, so
//! the host bridge (or any other consumer) can subscribe without the store
//! knowing anything about DOM event dispatch.

use crate::state::{Message, NavigationAction};

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    /// A user send was accepted (trimmed, non-empty) and appended to the
    /// store. Fires before the transmission attempt resolves.
    MessageSent { content: String },
    /// An assistant message was decoded and appended.
    MessageReceived { message: Message },
    /// An assistant message carried a navigation target.
    NavigationAction { action: NavigationAction },
    /// A recoverable fault was surfaced on the store.
    Error { error: String },
}
