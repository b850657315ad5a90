//! Pure presentation tree.
//!
//! [`build_view`] maps props plus a conversation snapshot to the structure a
//! renderer would paint. It holds no state of its own, so the element can
//! rebuild it on every attribute change or store update.

use chat_client::{ConversationState, MessageKind, Sender};

use crate::attributes::{Position, Theme, WidgetProps};

pub const HEADER_TITLE: &str = "Navigation Assistant";
const CONNECTING_PLACEHOLDER: &str = "Connecting...";

/// Theme after resolving `auto` against the host preference. Without a host
/// signal the widget resolves to light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTheme {
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub title: String,
    /// Drives the connection status dot.
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub sender: Sender,
    pub kind: MessageKind,
    pub content: String,
    /// True only for the synthetic welcome bubble.
    pub welcome: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputView {
    pub placeholder: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTree {
    pub theme: ResolvedTheme,
    pub position: Position,
    pub width: u32,
    pub max_height: u32,
    pub z_index: u32,
    pub header: HeaderView,
    pub rows: Vec<MessageRow>,
    pub show_loading_row: bool,
    pub input: InputView,
    pub error_banner: Option<String>,
}

pub fn build_view(props: &WidgetProps, state: &ConversationState) -> ViewTree {
    let mut rows = Vec::with_capacity(state.messages.len() + 1);
    if props.show_welcome_message && state.messages.is_empty() {
        rows.push(MessageRow {
            sender: Sender::Assistant,
            kind: MessageKind::Text,
            content: props.welcome_message.clone(),
            welcome: true,
        });
    }
    rows.extend(state.messages.iter().map(|m| MessageRow {
        sender: m.sender,
        kind: m.kind,
        content: m.content.clone(),
        welcome: false,
    }));

    let disabled = state.is_loading || !state.is_connected;
    ViewTree {
        theme: resolve_theme(props.theme),
        position: props.position,
        width: props.width,
        max_height: props.max_height,
        z_index: props.z_index,
        header: HeaderView {
            title: HEADER_TITLE.to_string(),
            connected: state.is_connected,
        },
        rows,
        show_loading_row: state.is_loading,
        input: InputView {
            placeholder: if disabled {
                CONNECTING_PLACEHOLDER.to_string()
            } else {
                props.placeholder.clone()
            },
            disabled,
        },
        error_banner: state.error.clone(),
    }
}

fn resolve_theme(theme: Theme) -> ResolvedTheme {
    match theme {
        Theme::Dark => ResolvedTheme::Dark,
        Theme::Light | Theme::Auto => ResolvedTheme::Light,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_client::Message;

    fn connected_state() -> ConversationState {
        ConversationState {
            is_connected: true,
            ..ConversationState::default()
        }
    }

    #[test]
    fn welcome_bubble_shows_only_on_empty_conversation() {
        let props = WidgetProps::default();
        let view = build_view(&props, &connected_state());
        assert_eq!(view.rows.len(), 1);
        assert!(view.rows[0].welcome);
        assert_eq!(view.rows[0].content, props.welcome_message);

        let mut state = connected_state();
        state.messages.push(Message::user("hi", false));
        let view = build_view(&props, &state);
        assert_eq!(view.rows.len(), 1);
        assert!(!view.rows[0].welcome);
    }

    #[test]
    fn welcome_bubble_can_be_disabled() {
        let props = WidgetProps {
            show_welcome_message: false,
            ..WidgetProps::default()
        };
        let view = build_view(&props, &connected_state());
        assert!(view.rows.is_empty());
    }

    #[test]
    fn input_disables_while_loading_or_disconnected() {
        let props = WidgetProps::default();

        let view = build_view(&props, &connected_state());
        assert!(!view.input.disabled);
        assert_eq!(view.input.placeholder, props.placeholder);

        let mut loading = connected_state();
        loading.is_loading = true;
        let view = build_view(&props, &loading);
        assert!(view.input.disabled);
        assert!(view.show_loading_row);
        assert_eq!(view.input.placeholder, "Connecting...");

        let view = build_view(&props, &ConversationState::default());
        assert!(view.input.disabled);
        assert!(!view.header.connected);
    }

    #[test]
    fn auto_theme_resolves_to_light() {
        let props = WidgetProps {
            theme: Theme::Auto,
            ..WidgetProps::default()
        };
        assert_eq!(build_view(&props, &connected_state()).theme, ResolvedTheme::Light);
    }

    #[test]
    fn error_banner_mirrors_store_error() {
        let mut state = ConversationState::default();
        state.error = Some("Connection closed".to_string());
        let view = build_view(&WidgetProps::default(), &state);
        assert_eq!(view.error_banner.as_deref(), Some("Connection closed"));
    }
}
