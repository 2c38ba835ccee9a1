//! Client session for the line-oriented replay front-end.

use parking_lot::RwLock;
use sldispatch_core::Session;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Mutable per-connection state, guarded by the session lock.
#[derive(Debug, Default)]
struct SessionState {
    nick: Option<String>,
    registered: bool,
}

/// One connected client.
///
/// Commands receive `&ClientSession`; state changes go through interior
/// mutability. Replies are queued on an unbounded channel drained by the
/// writer.
#[derive(Debug)]
pub struct ClientSession {
    id: String,
    state: RwLock<SessionState>,
    closed: AtomicBool,
    outgoing: mpsc::UnboundedSender<String>,
}

impl ClientSession {
    /// Create a session and the receiving end of its reply queue.
    pub fn new(id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            id: id.into(),
            state: RwLock::new(SessionState::default()),
            closed: AtomicBool::new(false),
            outgoing: tx,
        };
        (session, rx)
    }

    /// Current nick, if one was set.
    pub fn nick(&self) -> Option<String> {
        self.state.read().nick.clone()
    }

    /// Get the nick or "*" for numeric replies.
    pub fn nick_or_star(&self) -> String {
        self.nick().unwrap_or_else(|| "*".to_string())
    }

    pub fn is_registered(&self) -> bool {
        self.state.read().registered
    }

    /// Set the nick and mark the session registered.
    ///
    /// Returns the previous nick.
    pub fn register(&self, nick: impl Into<String>) -> Option<String> {
        let mut state = self.state.write();
        state.registered = true;
        state.nick.replace(nick.into())
    }

    /// Queue one reply line.
    pub fn send(&self, line: impl Into<String>) {
        if self.outgoing.send(line.into()).is_err() {
            debug!(session = %self.id, "Reply dropped, writer gone");
        }
    }

    /// Mark the session closed. The read loop stops after the current line.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Session for ClientSession {
    fn session_id(&self) -> &str {
        &self.id
    }
}
