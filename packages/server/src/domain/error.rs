//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// Username validation error
    #[error("Username cannot be empty")]
    UsernameEmpty,

    /// Username too long error
    #[error("Username cannot exceed {max} characters (got {actual})")]
    UsernameTooLong { max: usize, actual: usize },

    /// RoomId validation error
    #[error("RoomId cannot be empty")]
    RoomIdEmpty,

    /// RoomId too long error
    #[error("RoomId cannot exceed {max} characters (got {actual})")]
    RoomIdTooLong { max: usize, actual: usize },

    /// RoomId must be a single path segment
    #[error("RoomId cannot contain '/' (got: {0})")]
    RoomIdInvalidFormat(String),

    /// SessionId is not a UUID
    #[error("SessionId must be a valid UUID (got: {0})")]
    SessionIdInvalidFormat(String),

    /// MessageText validation error
    #[error("MessageText cannot be empty or whitespace only")]
    MessageTextEmpty,

    /// MessageText too long error
    #[error("MessageText cannot exceed {max} characters (got {actual})")]
    MessageTextTooLong { max: usize, actual: usize },

    /// FileUrl validation error
    #[error("FileUrl cannot be empty")]
    FileUrlEmpty,

    /// MimeType validation error
    #[error("MimeType must look like 'type/subtype' (got: {0:?})")]
    MimeTypeInvalidFormat(String),
}

/// Reasons an inbound envelope is rejected (`InvalidEnvelope`).
///
/// A rejected envelope is dropped; the connection stays open.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Frame is not a JSON object of a known envelope type
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Non-text frames carry no envelope
    #[error("unsupported frame: {0}")]
    UnsupportedFrame(String),

    /// A required field is absent
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A field is present but fails validation
    #[error("invalid field '{field}': {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: ValueObjectError,
    },

    /// Envelope claims a sender other than the connection identity
    #[error("sender '{claimed}' does not match connection identity '{identity}'")]
    SenderMismatch { claimed: String, identity: String },

    /// File size must be non-negative
    #[error("file_size cannot be negative (got {0})")]
    NegativeFileSize(i64),
}

/// Errors raised by a session's outbound queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session is already closed
    #[error("session {0} is closed")]
    Closed(String),

    /// The bounded outbound queue overflowed; the session has been closed
    #[error("outbound queue of session {session_id} is full (capacity {capacity})")]
    QueueFull { session_id: String, capacity: usize },
}

/// Illegal lifecycle transition of a connection session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid session transition: {from} -> {to}")]
pub struct StateTransitionError {
    pub from: String,
    pub to: String,
}

/// Errors related to room membership
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A closed session cannot join any room
    #[error("session {0} is closed and cannot join a room")]
    SessionClosed(String),

    /// The sending session is not a member of the room it broadcasts to
    #[error("session {session_id} is not a member of room '{room_id}'")]
    NotAMember { session_id: String, room_id: String },
}

/// Errors raised by the durable message log
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached
    #[error("message store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the write
    #[error("message store rejected the write: {0}")]
    Rejected(String),

    /// A stored row no longer satisfies domain validation
    #[error("corrupt record in message store: {0}")]
    CorruptRecord(String),
}

/// Errors raised by the user identity directory
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The directory could not be reached
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}
