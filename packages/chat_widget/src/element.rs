//! The custom-element style host bridge.
//!
//! A [`ChatWidgetElement`] carries an attribute map and an event target from
//! construction. Attaching it to a [`HostDocument`] mounts the runtime: one
//! conversation actor plus an event pump that re-emits conversation activity
//! as DOM-style [`CustomEvent`]s. Detaching tears the runtime down, which is
//! the only thing that stops auto-reconnect.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use chat_client::{
    ChatClientConfig, Connector, ConversationEvent, ConversationHandle, WebSocketConnector,
    spawn_conversation,
};

use crate::attributes::{OBSERVED_ATTRIBUTES, WidgetProps};
use crate::host::{CustomEvent, EventTarget};
use crate::view::{ViewTree, build_view};

pub struct ChatWidgetElement {
    attributes: BTreeMap<String, String>,
    target: EventTarget,
    /// Set while attached to a document; bubbling events are forwarded here.
    document: Option<EventTarget>,
    mount: Option<RenderRoot>,
    connector: Arc<dyn Connector>,
}

/// Everything that exists only while the element is mounted.
struct RenderRoot {
    handle: ConversationHandle,
    websocket_url: String,
    view: ViewTree,
    render_count: u64,
    pump: JoinHandle<()>,
}

impl RenderRoot {
    fn unmount(self) {
        self.handle.teardown();
        self.pump.abort();
    }
}

impl Default for ChatWidgetElement {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatWidgetElement {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(WebSocketConnector))
    }

    /// Swap the transport factory; tests mount against a scripted connector.
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            attributes: BTreeMap::new(),
            target: EventTarget::new(),
            document: None,
            mount: None,
            connector,
        }
    }

    pub fn observed_attributes() -> &'static [&'static str] {
        OBSERVED_ATTRIBUTES
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Set an attribute, re-rendering a mounted element when an observed
    /// attribute actually changes value.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let old = self.attributes.insert(name.clone(), value.to_string());
        self.attribute_changed(&name, old.as_deref(), Some(value));
    }

    pub fn remove_attribute(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        let old = self.attributes.remove(&name);
        self.attribute_changed(&name, old.as_deref(), None);
    }

    fn attribute_changed(&mut self, name: &str, old: Option<&str>, new: Option<&str>) {
        if old == new {
            return;
        }
        if !OBSERVED_ATTRIBUTES.contains(&name) {
            return;
        }
        debug!(attribute = name, "observed attribute changed");
        if self.mount.is_some() {
            self.render();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_some()
    }

    /// Renders performed by the current mount. Resets when the runtime is
    /// replaced.
    pub fn render_count(&self) -> u64 {
        self.mount.as_ref().map(|r| r.render_count).unwrap_or(0)
    }

    /// The presentation tree from the latest render.
    pub fn view(&self) -> Option<&ViewTree> {
        self.mount.as_ref().map(|r| &r.view)
    }

    /// Rebuild the view from the live store without changing the runtime.
    /// Hosts call this when the watch channel reports a state change.
    pub fn refresh_view(&mut self) {
        let props = WidgetProps::from_attributes(&self.attributes);
        if let Some(root) = self.mount.as_mut() {
            root.view = build_view(&props, &root.handle.state());
        }
    }

    /// Handle to the mounted conversation, if any.
    pub fn conversation(&self) -> Option<&ConversationHandle> {
        self.mount.as_ref().map(|r| &r.handle)
    }

    /// Events dispatched on this element (bubbling or not).
    pub fn events(&self) -> broadcast::Receiver<CustomEvent> {
        self.target.subscribe()
    }

    pub(crate) fn connected(&mut self, document: EventTarget) {
        if self.mount.is_some() {
            debug!("element already mounted, ignoring attach");
            return;
        }
        info!("chat widget attached");
        self.document = Some(document);
        self.render();
    }

    pub(crate) fn disconnected(&mut self) {
        info!("chat widget detached");
        self.document = None;
        if let Some(root) = self.mount.take() {
            root.unmount();
        }
    }

    fn render(&mut self) {
        let props = WidgetProps::from_attributes(&self.attributes);

        // Changing the transport url is the one prop change that cannot be
        // absorbed by the running conversation: replace the runtime.
        let url_changed = self
            .mount
            .as_ref()
            .is_some_and(|root| root.websocket_url != props.websocket_url);
        if url_changed {
            info!(url = %props.websocket_url, "websocket url changed, replacing runtime");
            if let Some(root) = self.mount.take() {
                root.unmount();
            }
        }

        match self.mount.as_mut() {
            Some(root) => {
                root.view = build_view(&props, &root.handle.state());
                root.render_count += 1;
            }
            None => self.mount = Some(self.mount_runtime(props)),
        }
    }

    fn mount_runtime(&self, props: WidgetProps) -> RenderRoot {
        let config = ChatClientConfig::with_url(props.websocket_url.clone());
        let handle = spawn_conversation(config, Arc::clone(&self.connector));
        let pump = spawn_event_pump(
            handle.subscribe_events(),
            self.target.clone(),
            self.document.clone(),
        );
        RenderRoot {
            view: build_view(&props, &handle.state()),
            render_count: 1,
            websocket_url: props.websocket_url,
            handle,
            pump,
        }
    }
}

impl Drop for ChatWidgetElement {
    /// A dropped element must not leave a connection (or a pending
    /// reconnect timer) running.
    fn drop(&mut self) {
        if let Some(root) = self.mount.take() {
            root.unmount();
        }
    }
}

fn spawn_event_pump(
    mut events: broadcast::Receiver<ConversationEvent>,
    target: EventTarget,
    document: Option<EventTarget>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let dom = dom_event(event);
                    target.dispatch(dom.clone());
                    if dom.bubbles {
                        if let Some(doc) = &document {
                            doc.dispatch(dom);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "event pump lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn dom_event(event: ConversationEvent) -> CustomEvent {
    match event {
        ConversationEvent::MessageSent { content } => {
            CustomEvent::bubbling("message-sent", json!({ "message": content }))
        }
        ConversationEvent::MessageReceived { message } => CustomEvent::bubbling(
            "message-received",
            json!({ "message": serde_json::to_value(&message).unwrap_or_default() }),
        ),
        ConversationEvent::NavigationAction { action } => CustomEvent::bubbling(
            "navigation-action",
            serde_json::to_value(&action).unwrap_or_default(),
        ),
        ConversationEvent::Error { error } => {
            CustomEvent::bubbling("error", json!({ "error": error }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_client::{Message, NavigationAction, NavigationKind};

    #[test]
    fn dom_event_names_and_details() {
        let sent = dom_event(ConversationEvent::MessageSent {
            content: "hi".to_string(),
        });
        assert_eq!(sent.name, "message-sent");
        assert_eq!(sent.detail["message"], "hi");
        assert!(sent.bubbles && sent.composed);

        let received = dom_event(ConversationEvent::MessageReceived {
            message: Message::user("hello", false),
        });
        assert_eq!(received.name, "message-received");
        assert_eq!(received.detail["message"]["content"], "hello");

        let nav = dom_event(ConversationEvent::NavigationAction {
            action: NavigationAction {
                kind: NavigationKind::Navigate,
                target: "/billing".to_string(),
                data: None,
            },
        });
        assert_eq!(nav.name, "navigation-action");
        assert_eq!(nav.detail["type"], "navigate");
        assert_eq!(nav.detail["target"], "/billing");

        let err = dom_event(ConversationEvent::Error {
            error: "Connection error".to_string(),
        });
        assert_eq!(err.name, "error");
        assert_eq!(err.detail["error"], "Connection error");
    }
}
