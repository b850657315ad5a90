//! Minimal host-page surface: event targets and a document to attach to.
//!
//! Embedders that already have an event bus adapt it on top of
//! [`EventTarget`]; the demo and the tests use [`HostDocument`] directly.

use tokio::sync::broadcast;

use crate::element::ChatWidgetElement;

/// An event dispatched by the widget toward the host page.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    pub name: String,
    pub detail: serde_json::Value,
    /// Whether the event also reaches the document the element is attached
    /// to.
    pub bubbles: bool,
    /// Whether the event crosses the widget's render boundary. All widget
    /// events do.
    pub composed: bool,
}

impl CustomEvent {
    pub fn bubbling(name: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            detail,
            bubbles: true,
            composed: true,
        }
    }
}

/// Fan-out point for [`CustomEvent`]s. Cheap to clone; all clones share the
/// same subscriber set.
#[derive(Clone)]
pub struct EventTarget {
    tx: broadcast::Sender<CustomEvent>,
}

impl EventTarget {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CustomEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn dispatch(&self, event: CustomEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.tx.send(event);
    }
}

/// Stand-in for the host page's document: the attachment point for widget
/// elements and the sink bubbling events reach.
pub struct HostDocument {
    target: EventTarget,
}

impl Default for HostDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDocument {
    pub fn new() -> Self {
        Self {
            target: EventTarget::new(),
        }
    }

    /// Events that bubbled up from any attached element.
    pub fn subscribe(&self) -> broadcast::Receiver<CustomEvent> {
        self.target.subscribe()
    }

    /// Attach the element, triggering its mount lifecycle.
    pub fn append(&self, element: &mut ChatWidgetElement) {
        element.connected(self.target.clone());
    }

    /// Detach the element, triggering unmount and connection teardown.
    pub fn remove(&self, element: &mut ChatWidgetElement) {
        element.disconnected();
    }
}
