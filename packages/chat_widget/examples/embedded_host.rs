//! Embed the widget in a fake host page over a scripted transport and print
//! what the host would observe: bubbled events and the rendered view.
//!
//! Run with: cargo run -p chat_widget --example embedded_host

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chat_client::testing::MockConnector;
use chat_widget::{HostDocument, create_chat_widget_with_connector};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let document = HostDocument::new();
    let connector = MockConnector::new();
    let mut page_events = document.subscribe();

    let mut element = create_chat_widget_with_connector(
        &document,
        Arc::new(connector.clone()),
        &[("theme", "dark"), ("position", "bottom-left")],
    );
    connector.wait_for_connects(1).await;

    let handle = element
        .conversation()
        .expect("widget is mounted")
        .clone();
    handle.send_message("take me to billing", None).await;

    // Script the assistant reply the server would send.
    let remote = connector.latest_remote().expect("transport is open");
    remote.push_text(
        r#"{"type":"response","content":"Taking you to the billing page","navigationTarget":"/billing","messageCount":1}"#,
    );

    for _ in 0..3 {
        let event = page_events.recv().await?;
        println!("page saw `{}` event: {}", event.name, event.detail);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    element.refresh_view();
    let view = element.view().expect("widget is mounted");
    println!("\nrendered view ({:?}, {:?}):", view.theme, view.position);
    for row in &view.rows {
        println!("  [{:?}] {}", row.sender, row.content);
    }
    println!("  input disabled: {}", view.input.disabled);

    println!("\nframes the client sent:");
    for frame in remote.sent_frames() {
        println!("  {frame}");
    }

    document.remove(&mut element);
    Ok(())
}
