//! Transport seam between the connection actor and the wire.
//!
//! The actor only ever sees [`TransportEvent`]s, so tests drive the state
//! machine with the scripted double in [`crate::testing`] while production
//! uses the `tokio-tungstenite` client here.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::{debug, warn};

/// Close code reported when the peer vanished without a close frame
/// (mirrors the WebSocket "abnormal closure" status).
pub(crate) const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code reported when a close frame carried no status.
const NO_STATUS: u16 = 1005;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The url is not something a WebSocket client can dial. Not retried.
    #[error("invalid websocket url: {0}")]
    InvalidUrl(String),
    /// Dialing or the open handshake failed. Retried like an abnormal close.
    #[error("websocket connect failed: {0}")]
    Connect(String),
    #[error("websocket send failed: {0}")]
    Send(String),
}

/// What the peer did, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One complete text frame.
    Message(String),
    /// A socket-level fault. The connection is not closed yet; a `Closed`
    /// event follows and drives the reconnect decision.
    Error(String),
    /// The connection is gone. The transport is spent after this.
    Closed { code: u16 },
}

/// One live bidirectional connection, already past its open handshake.
#[async_trait]
pub trait Transport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;
    /// Wait for the next peer event.
    async fn next_event(&mut self) -> TransportEvent;
    /// Best-effort close with an explicit code. Errors are logged, not
    /// surfaced since the transport is being discarded either way.
    async fn close(&mut self, code: u16, reason: &str);
}

/// Opens transports. The actor holds one connector for its whole lifetime
/// and redials through it on every reconnect.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError>;
}

/// Production connector backed by `tokio-tungstenite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        debug!(%url, "websocket handshake complete");
        let (sink, stream) = stream.split();
        Ok(Box::new(WebSocketTransport { sink, stream }))
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct WebSocketTransport {
    sink: SplitSink<WsStream, tungstenite::Message>,
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn next_event(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    return TransportEvent::Message(text.to_string());
                }
                Some(Ok(tungstenite::Message::Close(frame))) => {
                    let code = frame.map(|f| u16::from(f.code)).unwrap_or(NO_STATUS);
                    return TransportEvent::Closed { code };
                }
                // Pings are answered by tungstenite itself; binary frames
                // are not part of this protocol.
                Some(Ok(other)) => {
                    debug!(kind = ?other, "ignoring non-text frame");
                }
                Some(Err(e)) => return TransportEvent::Error(e.to_string()),
                None => return TransportEvent::Closed { code: ABNORMAL_CLOSURE },
            }
        }
    }

    async fn close(&mut self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        if let Err(e) = self.sink.send(tungstenite::Message::Close(Some(frame))).await {
            warn!(error = %e, "failed to send close frame");
        }
        let _ = self.sink.flush().await;
    }
}
