//! In-memory transport doubles for exercising the connection state machine
//! without a network. Used by this crate's integration tests, by
//! `chat_widget`'s bridge tests, and by the embedding demo.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use crate::transport::{Connector, Transport, TransportError, TransportEvent};

/// The far side of one [`MockTransport`]: push inbound events, inspect what
/// the client sent, observe the close code.
#[derive(Clone)]
pub struct MockRemote {
    events: mpsc::UnboundedSender<TransportEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<Option<(u16, String)>>>,
}

impl MockRemote {
    pub fn push_text(&self, raw: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Message(raw.into()));
    }

    pub fn push_error(&self, message: impl Into<String>) {
        let _ = self.events.send(TransportEvent::Error(message.into()));
    }

    pub fn push_close(&self, code: u16) {
        let _ = self.events.send(TransportEvent::Closed { code });
    }

    /// Frames the client transmitted, oldest first.
    pub fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    /// Close code the client sent, if it closed this transport itself.
    pub fn client_close_code(&self) -> Option<u16> {
        self.closed
            .lock()
            .expect("lock poisoned")
            .as_ref()
            .map(|(code, _)| *code)
    }
}

pub struct MockTransport {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<Option<(u16, String)>>>,
    fail_sends: bool,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Send("mock send failure".to_string()));
        }
        self.sent.lock().expect("lock poisoned").push(text);
        Ok(())
    }

    async fn next_event(&mut self) -> TransportEvent {
        match self.events.recv().await {
            Some(event) => event,
            // Remote dropped without scripting a close; stay silent so the
            // test controls every observable transition.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self, code: u16, reason: &str) {
        *self.closed.lock().expect("lock poisoned") = Some((code, reason.to_string()));
    }
}

#[derive(Default)]
struct MockConnectorInner {
    connects: AtomicUsize,
    fail_next: Mutex<VecDeque<TransportError>>,
    fail_sends: AtomicBool,
    remotes: Mutex<Vec<MockRemote>>,
    notify: Notify,
}

/// Hands out a fresh scripted transport per connect and counts every dial.
#[derive(Clone, Default)]
pub struct MockConnector {
    inner: Arc<MockConnectorInner>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Script the next `n` connect attempts to fail with a handshake error.
    pub fn fail_next_connects(&self, n: usize) {
        let mut queue = self.inner.fail_next.lock().expect("lock poisoned");
        for _ in 0..n {
            queue.push_back(TransportError::Connect("mock connect refused".to_string()));
        }
    }

    /// Make every transport handed out from now on reject sends.
    pub fn fail_sends(&self, fail: bool) {
        self.inner.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn remotes(&self) -> Vec<MockRemote> {
        self.inner.remotes.lock().expect("lock poisoned").clone()
    }

    pub fn latest_remote(&self) -> Option<MockRemote> {
        self.inner.remotes.lock().expect("lock poisoned").last().cloned()
    }

    /// Wait until at least `count` connect attempts have been observed.
    pub async fn wait_for_connects(&self, count: usize) {
        loop {
            let notified = self.inner.notify.notified();
            if self.connect_count() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn Transport>, TransportError> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        let scripted_failure = self.inner.fail_next.lock().expect("lock poisoned").pop_front();
        if let Some(err) = scripted_failure {
            self.inner.notify.notify_waiters();
            return Err(err);
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(None));
        let remote = MockRemote {
            events: events_tx,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        self.inner.remotes.lock().expect("lock poisoned").push(remote);
        self.inner.notify.notify_waiters();

        Ok(Box::new(MockTransport {
            events: events_rx,
            sent,
            closed,
            fail_sends: self.inner.fail_sends.load(Ordering::SeqCst),
        }))
    }
}
