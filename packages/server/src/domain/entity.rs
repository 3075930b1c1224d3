//! Entities and read models of the relay domain.

use super::value_object::{RoomId, SessionId, Timestamp, Username};

/// A user known to the identity directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: Username,
}

/// Chat message ready to be written to the durable log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageRecord {
    pub room_id: RoomId,
    pub text: String,
    pub sender: UserRecord,
    pub receiver: UserRecord,
    pub timestamp: Timestamp,
}

/// A message stored in the durable log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMessage {
    pub id: i64,
    pub room_id: RoomId,
    pub text: String,
    pub sender: Username,
    pub receiver: Username,
    pub timestamp: Timestamp,
}

/// One member of a room, as exposed to read endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub session_id: SessionId,
    pub username: Username,
    pub connected_at: Timestamp,
}

/// Point-in-time view of a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub members: Vec<MemberInfo>,
}

/// Outcome of a broadcast to one room
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Sessions the envelope was enqueued to
    pub delivered: usize,
    /// Sessions that failed to accept the envelope and were evicted
    pub failed: Vec<SessionId>,
}
