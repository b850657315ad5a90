//! The connection state machine.
//!
//! One actor task owns one transport at a time plus the conversation store.
//! Consumers talk to it through a cloneable [`ConversationHandle`]; state
//! flows out on a watch channel, activity on a broadcast channel. Teardown
//! is a cancellation token so an unmounted widget can never resurrect its
//! connection from a pending reconnect timer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use chat_wire::{AudioClip, NORMAL_CLOSURE, close_reason_message, decode_inbound, encode_outbound, should_reconnect};

use crate::config::ChatClientConfig;
use crate::events::ConversationEvent;
use crate::session::generate_session_id;
use crate::state::{ConversationState, Message};
use crate::transport::{ABNORMAL_CLOSURE, Connector, Transport, TransportError, TransportEvent};

/// Readiness phase of the owned connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

#[derive(Debug)]
enum ConversationCommand {
    Connect,
    Send {
        content: String,
        audio: Option<AudioClip>,
    },
    Clear,
    Reconnect,
}

type ConnectFuture = Pin<Box<dyn Future<Output = Result<Box<dyn Transport>, TransportError>> + Send>>;

/// Cloneable handle to a spawned conversation.
///
/// Dropping every handle (or calling [`teardown`](Self::teardown)) stops the
/// actor, closes the transport with a normal-closure code, and cancels any
/// pending reconnect.
#[derive(Clone)]
pub struct ConversationHandle {
    cmd_tx: mpsc::Sender<ConversationCommand>,
    state_rx: watch::Receiver<ConversationState>,
    events_tx: broadcast::Sender<ConversationEvent>,
    cancel: CancellationToken,
}

impl ConversationHandle {
    /// Current store snapshot.
    pub fn state(&self) -> ConversationState {
        self.state_rx.borrow().clone()
    }

    /// Watch channel for reactive consumers (the presentation tree).
    pub fn watch_state(&self) -> watch::Receiver<ConversationState> {
        self.state_rx.clone()
    }

    /// Subscribe to typed activity events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ConversationEvent> {
        self.events_tx.subscribe()
    }

    /// Request a connection attempt. No-op while already open.
    pub async fn connect(&self) {
        let _ = self.cmd_tx.send(ConversationCommand::Connect).await;
    }

    /// Send a user message, optionally with a recorded audio clip.
    ///
    /// Empty or whitespace-only content is silently ignored. The user entry
    /// is appended to the store before any network I/O; there is no queuing
    /// across disconnects; a send while disconnected surfaces an error and
    /// triggers a recovery connect instead.
    pub async fn send_message(&self, content: impl Into<String>, audio: Option<AudioClip>) {
        let _ = self
            .cmd_tx
            .send(ConversationCommand::Send {
                content: content.into(),
                audio,
            })
            .await;
    }

    /// Empty `messages` and `error` without touching connection readiness.
    pub async fn clear_conversation(&self) {
        let _ = self.cmd_tx.send(ConversationCommand::Clear).await;
    }

    /// Force a close-then-connect cycle (manual recovery UI).
    pub async fn reconnect(&self) {
        let _ = self.cmd_tx.send(ConversationCommand::Reconnect).await;
    }

    /// Permanently stop the conversation. The only path that suppresses
    /// auto-reconnect.
    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Spawn the connection actor. It dials immediately (connect-on-mount).
pub fn spawn_conversation(config: ChatClientConfig, connector: Arc<dyn Connector>) -> ConversationHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let initial = ConversationState {
        session_id: config.session_id.clone(),
        ..ConversationState::default()
    };
    let (state_tx, state_rx) = watch::channel(initial);
    let (events_tx, _) = broadcast::channel(64);
    let cancel = CancellationToken::new();

    let actor = ConversationActor {
        config,
        connector,
        cmd_rx,
        state_tx,
        events_tx: events_tx.clone(),
        cancel: cancel.clone(),
        readiness: Readiness::Idle,
        transport: None,
        connect_fut: None,
        reconnect_at: None,
        reconnect_attempts: 0,
    };
    tokio::spawn(actor.run());

    ConversationHandle {
        cmd_tx,
        state_rx,
        events_tx,
        cancel,
    }
}

/// One step of the actor loop, resolved by `tokio::select!`.
enum Step {
    Cancelled,
    Command(Option<ConversationCommand>),
    Connected(Result<Box<dyn Transport>, TransportError>),
    Transport(TransportEvent),
    ReconnectDue,
}

struct ConversationActor {
    config: ChatClientConfig,
    connector: Arc<dyn Connector>,
    cmd_rx: mpsc::Receiver<ConversationCommand>,
    state_tx: watch::Sender<ConversationState>,
    events_tx: broadcast::Sender<ConversationEvent>,
    cancel: CancellationToken,
    readiness: Readiness,
    /// Present exactly while `readiness` is `Open`.
    transport: Option<Box<dyn Transport>>,
    /// In-flight dial, present while `readiness` is `Connecting`.
    connect_fut: Option<ConnectFuture>,
    /// Deadline of the pending auto-reconnect, if one is scheduled.
    reconnect_at: Option<Instant>,
    reconnect_attempts: u32,
}

impl ConversationActor {
    async fn run(mut self) {
        self.begin_connect();
        loop {
            match self.next_step().await {
                Step::Cancelled => {
                    debug!("teardown requested");
                    self.shutdown().await;
                    break;
                }
                Step::Command(None) => {
                    debug!("all handles dropped");
                    self.shutdown().await;
                    break;
                }
                Step::Command(Some(cmd)) => self.handle_command(cmd).await,
                Step::Connected(res) => self.on_connect_result(res),
                Step::Transport(evt) => self.on_transport_event(evt),
                Step::ReconnectDue => {
                    self.reconnect_at = None;
                    info!("reconnect delay elapsed, redialing");
                    self.begin_connect();
                }
            }
        }
        debug!("conversation actor stopped");
    }

    async fn next_step(&mut self) -> Step {
        let Self {
            cmd_rx,
            cancel,
            transport,
            connect_fut,
            reconnect_at,
            ..
        } = self;
        let reconnect_deadline = reconnect_at.unwrap_or_else(Instant::now);

        tokio::select! {
            _ = cancel.cancelled() => Step::Cancelled,
            cmd = cmd_rx.recv() => Step::Command(cmd),
            res = async {
                match connect_fut.as_mut() {
                    Some(fut) => fut.await,
                    None => std::future::pending().await,
                }
            }, if connect_fut.is_some() => Step::Connected(res),
            evt = async {
                match transport.as_mut() {
                    Some(t) => t.next_event().await,
                    None => std::future::pending().await,
                }
            }, if transport.is_some() => Step::Transport(evt),
            _ = tokio::time::sleep_until(reconnect_deadline), if reconnect_at.is_some() => Step::ReconnectDue,
        }
    }

    async fn handle_command(&mut self, cmd: ConversationCommand) {
        match cmd {
            ConversationCommand::Connect => self.begin_connect(),
            ConversationCommand::Send { content, audio } => self.handle_send(content, audio).await,
            ConversationCommand::Clear => {
                debug!("clearing conversation");
                self.update_state(|s| {
                    s.messages.clear();
                    s.error = None;
                });
            }
            ConversationCommand::Reconnect => self.manual_reconnect().await,
        }
    }

    /// Transition to `connecting` unless a connection is already open or a
    /// dial is in flight (idempotent connect).
    fn begin_connect(&mut self) {
        if self.readiness == Readiness::Open {
            debug!("already connected, ignoring connect request");
            return;
        }
        if self.connect_fut.is_some() {
            debug!("connect already in flight");
            return;
        }
        self.readiness = Readiness::Connecting;
        info!(url = %self.config.websocket_url, "connecting to chat service");
        let connector = Arc::clone(&self.connector);
        let url = self.config.websocket_url.clone();
        self.connect_fut = Some(Box::pin(async move { connector.connect(&url).await }));
    }

    fn on_connect_result(&mut self, res: Result<Box<dyn Transport>, TransportError>) {
        self.connect_fut = None;
        match res {
            Ok(transport) => {
                info!("chat service connected");
                self.transport = Some(transport);
                self.readiness = Readiness::Open;
                self.reconnect_attempts = 0;
                self.update_state(|s| {
                    s.is_connected = true;
                    s.error = None;
                });
            }
            Err(TransportError::InvalidUrl(url)) => {
                // A url that can never work is not worth retrying.
                error!(%url, "refusing to dial invalid websocket url");
                self.readiness = Readiness::Closed;
                self.surface_error("Failed to connect to chat service", |s| {
                    s.is_connected = false;
                });
            }
            Err(e) => {
                // Treated like an abnormal close so the widget keeps
                // retrying on the fixed delay.
                warn!(error = %e, "connect attempt failed");
                self.readiness = Readiness::Closed;
                let message = close_reason_message(ABNORMAL_CLOSURE);
                self.surface_error(message, |s| {
                    s.is_connected = false;
                    s.is_loading = false;
                });
                self.schedule_reconnect();
            }
        }
    }

    fn on_transport_event(&mut self, evt: TransportEvent) {
        match evt {
            TransportEvent::Message(raw) => self.on_inbound(&raw),
            TransportEvent::Error(e) => {
                // The close event that follows drives the reconnect decision.
                warn!(error = %e, "transport error");
                self.surface_error("Connection error", |s| {
                    s.is_connected = false;
                });
            }
            TransportEvent::Closed { code } => {
                info!(code, "chat service connection closed");
                self.transport = None;
                self.readiness = Readiness::Closed;
                let message = close_reason_message(code);
                self.update_state(|s| {
                    s.is_connected = false;
                    s.is_loading = false;
                    s.error = Some(message.to_string());
                });
                if should_reconnect(code) {
                    self.emit_error(message);
                    self.schedule_reconnect();
                }
            }
        }
    }

    fn on_inbound(&mut self, raw: &str) {
        match decode_inbound(raw) {
            Ok(Some(resp)) => {
                let message = Message::assistant(&resp);
                debug!(message_count = ?message.message_count, "assistant message received");
                let stored = message.clone();
                self.update_state(move |s| {
                    s.messages.push(stored);
                    s.is_loading = false;
                });
                if let Some(action) = message.navigation_action() {
                    let _ = self
                        .events_tx
                        .send(ConversationEvent::NavigationAction { action });
                }
                let _ = self
                    .events_tx
                    .send(ConversationEvent::MessageReceived { message });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "failed to decode inbound frame");
                self.surface_error("Failed to parse server response", |s| {
                    s.is_loading = false;
                });
            }
        }
    }

    async fn handle_send(&mut self, content: String, audio: Option<AudioClip>) {
        let content = content.trim().to_string();
        if content.is_empty() {
            // Not a failure, a no-op.
            debug!("ignoring empty send");
            return;
        }

        let session_id = self.ensure_session_id();
        let message = Message::user(&content, audio.is_some());
        let stored = message.clone();
        self.update_state(move |s| {
            s.messages.push(stored);
            s.is_loading = true;
            s.error = None;
        });
        let _ = self
            .events_tx
            .send(ConversationEvent::MessageSent { content: content.clone() });

        let Some(transport) = self.transport.as_mut() else {
            warn!("send while disconnected, attempting recovery connect");
            self.surface_error("Not connected to chat service", |s| {
                s.is_loading = false;
            });
            self.begin_connect();
            return;
        };

        let frame = match encode_outbound(&content, &session_id, audio.as_ref(), self.config.max_audio_bytes) {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "failed to encode outbound frame");
                self.surface_error("Failed to send message", |s| {
                    s.is_loading = false;
                });
                return;
            }
        };

        if let Err(e) = transport.send_text(frame).await {
            // Transmit failures do not close the connection.
            warn!(error = %e, "failed to send frame");
            self.surface_error("Failed to send message", |s| {
                s.is_loading = false;
            });
        } else {
            debug!(session_id = %session_id, "frame sent");
        }
    }

    async fn manual_reconnect(&mut self) {
        info!("manual reconnect requested");
        self.reconnect_at = None;
        self.reconnect_attempts = 0;
        if let Some(mut transport) = self.transport.take() {
            self.readiness = Readiness::Closing;
            transport.close(NORMAL_CLOSURE, "manual reconnect").await;
        }
        self.readiness = Readiness::Closed;
        self.update_state(|s| {
            s.is_connected = false;
            s.error = None;
        });
        self.begin_connect();
    }

    fn schedule_reconnect(&mut self) {
        if let Some(max) = self.config.reconnect.max_attempts {
            if self.reconnect_attempts >= max {
                warn!(attempts = self.reconnect_attempts, "reconnect cap reached, staying disconnected");
                return;
            }
        }
        self.reconnect_attempts += 1;
        let delay = self.config.reconnect.delay;
        debug!(?delay, attempt = self.reconnect_attempts, "scheduling reconnect");
        self.reconnect_at = Some(Instant::now() + delay);
    }

    async fn shutdown(&mut self) {
        self.reconnect_at = None;
        self.connect_fut = None;
        if let Some(mut transport) = self.transport.take() {
            self.readiness = Readiness::Closing;
            debug!("closing transport with normal closure");
            transport.close(NORMAL_CLOSURE, "widget unmounting").await;
        }
        self.readiness = Readiness::Closed;
        self.update_state(|s| {
            s.is_connected = false;
            s.is_loading = false;
        });
    }

    fn ensure_session_id(&mut self) -> String {
        let existing = self.state_tx.borrow().session_id.clone();
        if let Some(id) = existing {
            return id;
        }
        let id = generate_session_id();
        debug!(session_id = %id, "created session");
        let assigned = id.clone();
        self.update_state(move |s| s.session_id = Some(assigned));
        id
    }

    fn update_state(&self, f: impl FnOnce(&mut ConversationState)) {
        self.state_tx.send_modify(f);
    }

    /// Set the store error and broadcast it as an `error` event.
    fn surface_error(&self, message: &str, also: impl FnOnce(&mut ConversationState)) {
        self.update_state(|s| {
            s.error = Some(message.to_string());
            also(s);
        });
        self.emit_error(message);
    }

    fn emit_error(&self, message: &str) {
        let _ = self.events_tx.send(ConversationEvent::Error {
            error: message.to_string(),
        });
    }
}
