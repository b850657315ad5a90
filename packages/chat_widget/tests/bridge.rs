//! End-to-end bridge scenarios against a scripted connector: lifecycle,
//! attribute-driven re-render, runtime replacement, and event re-emission.

use std::sync::Arc;
use std::time::Duration;

use chat_client::ConversationState;
use chat_client::testing::MockConnector;
use chat_widget::{
    ChatWidgetElement, HostDocument, ResolvedTheme, create_chat_widget_with_connector,
};

async fn wait_state(
    element: &ChatWidgetElement,
    pred: impl FnMut(&ConversationState) -> bool,
) -> ConversationState {
    let mut rx = element
        .conversation()
        .expect("element is mounted")
        .watch_state();
    rx.wait_for(pred).await.expect("state channel closed").clone()
}

/// Attach a widget over a scripted connector and wait for the first
/// connection to open.
async fn mounted_widget(attrs: &[(&str, &str)]) -> (HostDocument, ChatWidgetElement, MockConnector) {
    let document = HostDocument::new();
    let connector = MockConnector::new();
    let element = create_chat_widget_with_connector(&document, Arc::new(connector.clone()), attrs);
    connector.wait_for_connects(1).await;
    wait_state(&element, |s| s.is_connected).await;
    (document, element, connector)
}

#[tokio::test(start_paused = true)]
async fn mount_dials_once_and_renders() {
    let (_document, element, connector) = mounted_widget(&[]).await;
    assert!(element.is_mounted());
    assert_eq!(connector.connect_count(), 1);
    assert_eq!(element.render_count(), 1);

    let view = element.view().expect("mounted element has a view");
    assert!(view.rows[0].welcome);
    assert_eq!(view.width, 350);
}

#[tokio::test(start_paused = true)]
async fn observed_attribute_change_rerenders_without_redialing() {
    let (_document, mut element, connector) = mounted_widget(&[("theme", "light")]).await;

    element.set_attribute("theme", "dark");
    assert_eq!(element.render_count(), 2);
    assert_eq!(element.view().unwrap().theme, ResolvedTheme::Dark);
    assert_eq!(connector.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn setting_the_same_value_does_not_rerender() {
    let (_document, mut element, _connector) = mounted_widget(&[("theme", "dark")]).await;

    element.set_attribute("theme", "dark");
    assert_eq!(element.render_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unobserved_attribute_does_not_rerender() {
    let (_document, mut element, _connector) = mounted_widget(&[]).await;

    element.set_attribute("data-analytics-id", "widget-7");
    assert_eq!(element.render_count(), 1);
    assert_eq!(element.get_attribute("data-analytics-id"), Some("widget-7"));
}

#[tokio::test(start_paused = true)]
async fn websocket_url_change_replaces_the_runtime() {
    let (_document, mut element, connector) = mounted_widget(&[]).await;
    let first = element.conversation().expect("mounted").clone();

    element.set_attribute("websocket-url", "ws://chat.example/ws/chat");
    connector.wait_for_connects(2).await;

    assert!(first.is_torn_down());
    assert_eq!(connector.connect_count(), 2);
    let second = element.conversation().expect("remounted");
    assert!(!second.is_torn_down());
}

#[tokio::test(start_paused = true)]
async fn detach_cancels_a_pending_reconnect() {
    let (document, mut element, connector) = mounted_widget(&[]).await;
    let handle = element.conversation().expect("mounted").clone();

    // Abnormal close schedules a reconnect 3 seconds out.
    connector.latest_remote().expect("one transport").push_close(1006);
    wait_state(&element, |s| !s.is_connected).await;

    document.remove(&mut element);
    assert!(!element.is_mounted());
    assert!(handle.is_torn_down());

    tokio::time::advance(Duration::from_secs(30)).await;
    tokio::task::yield_now().await;
    assert_eq!(connector.connect_count(), 1, "detached widget must not redial");
}

#[tokio::test(start_paused = true)]
async fn conversation_events_reach_element_and_document() {
    let (document, element, connector) = mounted_widget(&[]).await;
    let mut on_element = element.events();
    let mut on_document = document.subscribe();

    let handle = element.conversation().expect("mounted");
    handle.send_message("take me to billing", None).await;
    wait_state(&element, |s| s.is_loading).await;

    let sent = on_element.recv().await.unwrap();
    assert_eq!(sent.name, "message-sent");
    assert_eq!(sent.detail["message"], "take me to billing");
    assert_eq!(on_document.recv().await.unwrap().name, "message-sent");

    connector.latest_remote().expect("one transport").push_text(
        r#"{"type":"response","content":"Taking you to billing","navigationTarget":"/billing","messageCount":1}"#,
    );
    wait_state(&element, |s| !s.is_loading).await;

    let nav = on_element.recv().await.unwrap();
    assert_eq!(nav.name, "navigation-action");
    assert_eq!(nav.detail["target"], "/billing");

    let received = on_element.recv().await.unwrap();
    assert_eq!(received.name, "message-received");
    assert_eq!(received.detail["message"]["content"], "Taking you to billing");
    assert_eq!(received.detail["message"]["messageCount"], 1);

    // The same events bubbled to the document, in the same order.
    assert_eq!(on_document.recv().await.unwrap().name, "navigation-action");
    assert_eq!(on_document.recv().await.unwrap().name, "message-received");
}

#[tokio::test(start_paused = true)]
async fn error_events_bubble_with_store_error_text() {
    let (document, element, connector) = mounted_widget(&[]).await;
    let mut on_document = document.subscribe();

    connector.latest_remote().expect("one transport").push_close(1009);
    wait_state(&element, |s| s.error.is_some()).await;

    let event = on_document.recv().await.unwrap();
    assert_eq!(event.name, "error");
    assert_eq!(event.detail["error"], "Message too large");
}

#[tokio::test(start_paused = true)]
async fn factory_applies_attributes_before_mounting() {
    let document = HostDocument::new();
    let connector = MockConnector::new();
    let element = create_chat_widget_with_connector(
        &document,
        Arc::new(connector.clone()),
        &[
            ("theme", "dark"),
            ("width", "420"),
            ("show-welcome-message", "false"),
        ],
    );
    connector.wait_for_connects(1).await;

    let view = element.view().expect("mounted");
    assert_eq!(view.theme, ResolvedTheme::Dark);
    assert_eq!(view.width, 420);
    assert!(view.rows.is_empty(), "welcome bubble disabled");
}

#[tokio::test(start_paused = true)]
async fn refresh_view_tracks_the_live_store() {
    let (_document, mut element, connector) = mounted_widget(&[]).await;

    // The mount-time view was built before the dial resolved.
    assert!(!element.view().unwrap().header.connected);
    element.refresh_view();
    assert!(element.view().unwrap().header.connected);
    assert!(!element.view().unwrap().input.disabled);

    connector.latest_remote().expect("one transport").push_close(1006);
    wait_state(&element, |s| !s.is_connected).await;
    element.refresh_view();

    let view = element.view().unwrap();
    assert!(!view.header.connected);
    assert!(view.input.disabled);
    assert_eq!(view.input.placeholder, "Connecting...");
    assert_eq!(view.error_banner.as_deref(), Some("Connection closed"));
}

#[tokio::test(start_paused = true)]
async fn dropping_a_mounted_element_tears_down_the_conversation() {
    let (_document, element, connector) = mounted_widget(&[]).await;
    let handle = element.conversation().expect("mounted").clone();

    drop(element);
    assert!(handle.is_torn_down());

    tokio::time::advance(Duration::from_secs(30)).await;
    tokio::task::yield_now().await;
    assert_eq!(connector.connect_count(), 1);
}
