//! Per-connection relay coordinator.
//!
//! Drives one connection through its lifecycle:
//!
//! ```text
//! CONNECTING --join--> JOINED --first envelope--> ACTIVE --close/error--> DISCONNECTING --drained--> CLOSED
//! ```
//!
//! A rejected join and a connection that closes before sending anything
//! skip ACTIVE but still pass through DISCONNECTING.
//!
//! The coordinator is transport-agnostic: inbound frames arrive as a
//! [`Stream`] of [`InboundFrame`] and outbound envelopes leave as JSON text
//! through a [`Sink`]. The WebSocket handler adapts axum's socket to these;
//! tests drive it with in-process channels.

use std::{fmt, sync::Arc, time::Duration};

use futures_util::{Sink, SinkExt, Stream, StreamExt};

use crate::{
    domain::{EnvelopeError, OutboundReceiver, RoomId, SessionId, SessionState, Username},
    infrastructure::dto::{conversion::parse_inbound, websocket::OutboundEnvelope},
    usecase::{JoinError, JoinRoomUseCase, LeaveRoomUseCase, RelayError, RelayMessageUseCase},
};

/// Default capacity of a session's outbound queue
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Default time a disconnecting session gets to flush its queue
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// A frame received from the client, stripped of transport details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    /// Binary payload (only its length is kept; binary frames carry no envelope)
    Binary(usize),
    /// Ping/pong and other control frames
    Control,
    Close,
}

/// Tunables of the relay coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySettings {
    pub outbound_capacity: usize,
    pub drain_timeout: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

/// Why a connection left the ACTIVE state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client sent a close frame
    ClientClosed,
    /// The inbound stream ended without a close frame
    StreamEnded,
    /// Reading from the transport failed
    TransportError(String),
    /// The session was closed by the relay (queue overflow or eviction)
    SessionClosed,
    /// Writing to the transport failed
    WriterFailed,
    /// The registry refused the session
    JoinRejected(JoinError),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::ClientClosed => f.write_str("client closed the connection"),
            DisconnectReason::StreamEnded => f.write_str("inbound stream ended"),
            DisconnectReason::TransportError(e) => write!(f, "transport error: {}", e),
            DisconnectReason::SessionClosed => f.write_str("session closed by the relay"),
            DisconnectReason::WriterFailed => f.write_str("outbound writer stopped"),
            DisconnectReason::JoinRejected(e) => write!(f, "join rejected: {}", e),
        }
    }
}

/// Summary of a finished connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOutcome {
    pub session_id: SessionId,
    pub final_state: SessionState,
    /// Every state the connection entered, in order
    pub states: Vec<SessionState>,
    /// Envelopes accepted and broadcast
    pub relayed: usize,
    /// Frames dropped as invalid
    pub dropped: usize,
    pub reason: DisconnectReason,
}

/// Relay coordinator shared by every connection
#[derive(Clone)]
pub struct RelayCoordinator {
    join_room_usecase: Arc<JoinRoomUseCase>,
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    relay_message_usecase: Arc<RelayMessageUseCase>,
    settings: RelaySettings,
}

impl RelayCoordinator {
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        relay_message_usecase: Arc<RelayMessageUseCase>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            join_room_usecase,
            leave_room_usecase,
            relay_message_usecase,
            settings,
        }
    }

    pub fn settings(&self) -> RelaySettings {
        self.settings
    }

    /// Run one connection to completion.
    ///
    /// `room_id` is the room the connection was opened for and `identity` the
    /// authenticated user; neither can be changed by inbound envelopes.
    pub async fn run<In, E, Out>(
        &self,
        room_id: RoomId,
        identity: Username,
        mut inbound: In,
        outbound: Out,
    ) -> ConnectionOutcome
    where
        In: Stream<Item = Result<InboundFrame, E>> + Unpin + Send,
        E: fmt::Display + Send,
        Out: Sink<String> + Unpin + Send + 'static,
        Out::Error: fmt::Display + Send,
    {
        let mut lifecycle = Lifecycle::new();
        let (session, receiver) = self
            .join_room_usecase
            .open_session(identity, self.settings.outbound_capacity);
        let session_id = session.id();

        // CONNECTING -> JOINED
        if let Err(e) = self.join_room_usecase.execute(&room_id, session.clone()).await {
            tracing::warn!("Session {} could not join room '{}': {}", session_id, room_id, e);
            lifecycle.advance(SessionState::Disconnecting, &session_id);
            session.close();
            lifecycle.advance(SessionState::Closed, &session_id);
            return ConnectionOutcome {
                session_id,
                final_state: lifecycle.state,
                states: lifecycle.states,
                relayed: 0,
                dropped: 0,
                reason: DisconnectReason::JoinRejected(e),
            };
        }
        lifecycle.advance(SessionState::Joined, &session_id);

        let mut writer = pusher_loop(receiver, outbound, session_id);
        let mut writer_finished = false;

        let mut relayed = 0;
        let mut dropped = 0;
        let reason = loop {
            tokio::select! {
                frame = inbound.next() => {
                    let frame = match frame {
                        None => break DisconnectReason::StreamEnded,
                        Some(Err(e)) => break DisconnectReason::TransportError(e.to_string()),
                        Some(Ok(InboundFrame::Close)) => break DisconnectReason::ClientClosed,
                        Some(Ok(InboundFrame::Control)) => continue,
                        Some(Ok(frame)) => frame,
                    };

                    // JOINED -> ACTIVE on the first envelope-bearing frame
                    if lifecycle.state == SessionState::Joined {
                        lifecycle.advance(SessionState::Active, &session_id);
                    }

                    let text = match frame {
                        InboundFrame::Text(text) => text,
                        InboundFrame::Binary(len) => {
                            dropped += 1;
                            let e = EnvelopeError::UnsupportedFrame(format!("binary ({} bytes)", len));
                            tracing::warn!("Dropped frame from session {}: {}", session_id, e);
                            continue;
                        }
                        InboundFrame::Control | InboundFrame::Close => continue,
                    };

                    let result = match parse_inbound(&text) {
                        Ok(draft) => {
                            self.relay_message_usecase
                                .execute(&room_id, &session, draft)
                                .await
                        }
                        Err(e) => Err(RelayError::InvalidEnvelope(e)),
                    };
                    match result {
                        Ok(_) => relayed += 1,
                        Err(RelayError::InvalidEnvelope(e)) => {
                            dropped += 1;
                            tracing::warn!("Dropped envelope from session {}: {}", session_id, e);
                        }
                        Err(e) => {
                            tracing::info!("Session {} can no longer relay: {}", session_id, e);
                            break DisconnectReason::SessionClosed;
                        }
                    }
                }
                _ = session.closed() => break DisconnectReason::SessionClosed,
                _ = &mut writer => {
                    writer_finished = true;
                    break DisconnectReason::WriterFailed;
                }
            }
        };

        // JOINED/ACTIVE -> DISCONNECTING
        lifecycle.advance(SessionState::Disconnecting, &session_id);
        tracing::info!(
            "Session {} ('{}') disconnecting from room '{}': {}",
            session_id,
            session.identity(),
            room_id,
            reason
        );
        self.leave_room_usecase.execute(&room_id, &session_id).await;
        session.close();
        // The writer sees the end of its queue once the last sender is gone
        drop(session);

        if !writer_finished
            && tokio::time::timeout(self.settings.drain_timeout, &mut writer)
                .await
                .is_err()
        {
            tracing::warn!(
                "Session {} did not drain within {:?}; aborting writer",
                session_id,
                self.settings.drain_timeout
            );
            writer.abort();
        }

        // DISCONNECTING -> CLOSED
        lifecycle.advance(SessionState::Closed, &session_id);
        ConnectionOutcome {
            session_id,
            final_state: lifecycle.state,
            states: lifecycle.states,
            relayed,
            dropped,
            reason,
        }
    }
}

/// Current state of one connection plus the states it went through
struct Lifecycle {
    state: SessionState,
    states: Vec<SessionState>,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: SessionState::Connecting,
            states: vec![SessionState::Connecting],
        }
    }

    fn advance(&mut self, next: SessionState, session_id: &SessionId) {
        match self.state.transition_to(next) {
            Ok(next) => {
                tracing::debug!("Session {}: {} -> {}", session_id, self.state, next);
                self.state = next;
                self.states.push(next);
            }
            Err(e) => tracing::error!("Session {}: {}", session_id, e),
        }
    }
}

/// Spawns a task that drains the session's outbound queue into the sink.
///
/// Ends when the queue is closed and empty, or when the sink fails.
fn pusher_loop<Out>(
    mut receiver: OutboundReceiver,
    mut sink: Out,
    session_id: SessionId,
) -> tokio::task::JoinHandle<()>
where
    Out: Sink<String> + Unpin + Send + 'static,
    Out::Error: fmt::Display + Send,
{
    tokio::spawn(async move {
        while let Some(envelope) = receiver.recv().await {
            let json = match serde_json::to_string(&OutboundEnvelope::from(envelope.as_ref())) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize envelope for {}: {}", session_id, e);
                    continue;
                }
            };
            if let Err(e) = sink.send(json).await {
                tracing::debug!("Writer for session {} stopped: {}", session_id, e);
                return;
            }
        }
        if let Err(e) = sink.close().await {
            tracing::debug!("Failed to close sink of session {}: {}", session_id, e);
        }
    })
}
