//! Domain layer: value objects, envelopes, sessions and the repository seams.

pub mod entity;
pub mod envelope;
pub mod error;
pub mod factory;
pub mod repository;
pub mod session;
pub mod value_object;

pub use entity::{
    DeliveryReport, MemberInfo, NewMessageRecord, PersistedMessage, RoomSnapshot, UserRecord,
};
pub use envelope::{Envelope, EnvelopeBody, EnvelopeDraft, EnvelopeKind, FileAttachment};
pub use error::{
    DirectoryError, EnvelopeError, RegistryError, SessionError, StateTransitionError, StoreError,
    ValueObjectError,
};
pub use factory::SessionIdFactory;
pub use repository::{MessageStore, RoomRegistry, UserDirectory};
#[cfg(test)]
pub use repository::{MockMessageStore, MockUserDirectory};
pub use session::{OutboundReceiver, Session, SessionState};
pub use value_object::{
    FileUrl, MessageText, MimeType, RoomId, SessionId, Timestamp, Username,
};
