//! Connection session: lifecycle state and the bounded outbound queue.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::{Notify, mpsc};

use super::{
    envelope::Envelope,
    error::{SessionError, StateTransitionError},
    value_object::{SessionId, Timestamp, Username},
};

/// Lifecycle of one client connection.
///
/// ```text
/// Connecting -> Joined -> Active -> Disconnecting -> Closed
///      |           |                    ^
///      +-----------+--------------------+
/// ```
///
/// `Joined` becomes `Active` on the first inbound envelope. Every exit,
/// including a rejected join, passes through `Disconnecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    Joined,
    Active,
    Disconnecting,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Joined)
                | (Connecting, Disconnecting)
                | (Joined, Active)
                | (Joined, Disconnecting)
                | (Active, Disconnecting)
                | (Disconnecting, Closed)
        )
    }

    /// Move to `next`, refusing transitions outside the lifecycle graph.
    pub fn transition_to(self, next: SessionState) -> Result<SessionState, StateTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StateTransitionError {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// A joined or active connection hands inbound envelopes to the relay.
    pub fn accepts_inbound(&self) -> bool {
        matches!(self, SessionState::Joined | SessionState::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "CONNECTING",
            SessionState::Joined => "JOINED",
            SessionState::Active => "ACTIVE",
            SessionState::Disconnecting => "DISCONNECTING",
            SessionState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// Receiving half of a session's outbound queue, owned by the connection writer.
pub type OutboundReceiver = mpsc::Receiver<Arc<Envelope>>;

/// Server-side representation of one live connection.
///
/// Enqueueing never blocks: a full queue closes the session instead of
/// stalling the broadcaster.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    identity: Username,
    connected_at: Timestamp,
    outbound: mpsc::Sender<Arc<Envelope>>,
    capacity: usize,
    closed: AtomicBool,
    close_notify: Notify,
}

impl Session {
    /// Create a session together with the receiving end of its outbound queue.
    ///
    /// `capacity` is clamped to at least 1.
    pub fn new(
        id: SessionId,
        identity: Username,
        connected_at: Timestamp,
        capacity: usize,
    ) -> (Self, OutboundReceiver) {
        let capacity = capacity.max(1);
        let (outbound, receiver) = mpsc::channel(capacity);
        let session = Self {
            id,
            identity,
            connected_at,
            outbound,
            capacity,
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
        };
        (session, receiver)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn identity(&self) -> &Username {
        &self.identity
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueue an envelope for delivery to this session.
    ///
    /// # Errors
    ///
    /// * [`SessionError::QueueFull`] when the queue overflowed; the session is closed.
    /// * [`SessionError::Closed`] when the session was already closed.
    pub fn send(&self, envelope: Arc<Envelope>) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed(self.id.to_string()));
        }
        match self.outbound.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.close();
                Err(SessionError::QueueFull {
                    session_id: self.id.to_string(),
                    capacity: self.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.close();
                Err(SessionError::Closed(self.id.to_string()))
            }
        }
    }

    /// Mark the session closed and wake everything waiting in [`Session::closed`].
    ///
    /// Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.close_notify.notify_waiters();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolve once the session has been closed.
    pub async fn closed(&self) {
        loop {
            let notified = self.close_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }
}
