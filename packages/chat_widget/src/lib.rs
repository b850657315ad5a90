//! Custom-element style host bridge for the embedded chat widget.
//!
//! Wraps a `chat_client` conversation in an element with string attributes,
//! a mount/unmount lifecycle, and DOM-style event re-emission, so any host
//! page abstraction can embed the widget without knowing about tokio
//! channels or the wire protocol.

mod attributes;
mod element;
mod host;
mod view;

pub use attributes::{
    DEFAULT_API_ENDPOINT, DEFAULT_PLACEHOLDER, DEFAULT_WELCOME_MESSAGE, OBSERVED_ATTRIBUTES,
    Position, Theme, WidgetProps,
};
pub use element::ChatWidgetElement;
pub use host::{CustomEvent, EventTarget, HostDocument};
pub use view::{HEADER_TITLE, HeaderView, InputView, MessageRow, ResolvedTheme, ViewTree, build_view};

/// Build an element with the given attributes and attach it to `document`.
///
/// The programmatic equivalent of writing a `<chat-widget>` tag: the
/// element mounts (and dials) before this returns.
pub fn create_chat_widget(document: &HostDocument, attributes: &[(&str, &str)]) -> ChatWidgetElement {
    let mut element = ChatWidgetElement::new();
    for (name, value) in attributes {
        element.set_attribute(name, value);
    }
    document.append(&mut element);
    element
}

/// [`create_chat_widget`] with an explicit transport factory.
pub fn create_chat_widget_with_connector(
    document: &HostDocument,
    connector: std::sync::Arc<dyn chat_client::Connector>,
    attributes: &[(&str, &str)],
) -> ChatWidgetElement {
    let mut element = ChatWidgetElement::with_connector(connector);
    for (name, value) in attributes {
        element.set_attribute(name, value);
    }
    document.append(&mut element);
    element
}
