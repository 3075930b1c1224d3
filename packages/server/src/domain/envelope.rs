//! Message envelope: the unit of delivery inside a room.
//!
//! An [`Envelope`] is only ever built through [`Envelope::validate`], so every
//! envelope that reaches the broadcast path is well-formed, carries the room
//! the connection is bound to, and has a relay-assigned timestamp.

use super::{
    error::EnvelopeError,
    value_object::{FileUrl, MessageText, MimeType, RoomId, Timestamp, Username},
};

/// Discriminant of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    Chat,
    File,
}

impl EnvelopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeKind::Chat => "chat",
            EnvelopeKind::File => "file",
        }
    }
}

/// Metadata of a file shared in a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub url: FileUrl,
    pub mime_type: MimeType,
    /// Size in bytes, 0 when the client did not say
    pub size: u64,
    /// Free-form caption (usually the file name); may be empty
    pub caption: String,
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeBody {
    Chat { text: MessageText },
    File(FileAttachment),
}

/// Unvalidated envelope fields as received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeDraft {
    pub kind: EnvelopeKind,
    pub message: Option<String>,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
}

impl EnvelopeDraft {
    /// Chat draft with every required field present
    pub fn chat(message: &str, sender: &str, receiver: &str) -> Self {
        Self {
            kind: EnvelopeKind::Chat,
            message: Some(message.to_string()),
            sender: Some(sender.to_string()),
            receiver: Some(receiver.to_string()),
            file_url: None,
            file_type: None,
            file_size: None,
        }
    }
}

/// A validated, immutable message envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    sender: Username,
    receiver: Username,
    room_id: RoomId,
    timestamp: Timestamp,
    body: EnvelopeBody,
}

impl Envelope {
    /// Validate a draft received on a connection bound to `room_id` and
    /// authenticated as `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError`] when a required field is missing or invalid,
    /// or when the claimed sender is not the connection identity.
    pub fn validate(
        draft: EnvelopeDraft,
        room_id: RoomId,
        identity: &Username,
        timestamp: Timestamp,
    ) -> Result<Self, EnvelopeError> {
        let sender = required_username(draft.sender, "sender")?;
        if &sender != identity {
            return Err(EnvelopeError::SenderMismatch {
                claimed: sender.into_string(),
                identity: identity.to_string(),
            });
        }
        let receiver = required_username(draft.receiver, "receiver")?;

        let body = match draft.kind {
            EnvelopeKind::Chat => {
                let text = draft.message.ok_or(EnvelopeError::MissingField("message"))?;
                let text = MessageText::new(text).map_err(|source| EnvelopeError::InvalidField {
                    field: "message",
                    source,
                })?;
                EnvelopeBody::Chat { text }
            }
            EnvelopeKind::File => {
                let url = draft.file_url.ok_or(EnvelopeError::MissingField("file_url"))?;
                let url = FileUrl::new(url).map_err(|source| EnvelopeError::InvalidField {
                    field: "file_url",
                    source,
                })?;
                let mime_type = draft
                    .file_type
                    .ok_or(EnvelopeError::MissingField("file_type"))?;
                let mime_type =
                    MimeType::new(mime_type).map_err(|source| EnvelopeError::InvalidField {
                        field: "file_type",
                        source,
                    })?;
                let size = match draft.file_size {
                    None => 0,
                    Some(size) => {
                        u64::try_from(size).map_err(|_| EnvelopeError::NegativeFileSize(size))?
                    }
                };
                EnvelopeBody::File(FileAttachment {
                    url,
                    mime_type,
                    size,
                    caption: draft.message.unwrap_or_default(),
                })
            }
        };

        Ok(Self {
            sender,
            receiver,
            room_id,
            timestamp,
            body,
        })
    }

    pub fn kind(&self) -> EnvelopeKind {
        match self.body {
            EnvelopeBody::Chat { .. } => EnvelopeKind::Chat,
            EnvelopeBody::File(_) => EnvelopeKind::File,
        }
    }

    pub fn sender(&self) -> &Username {
        &self.sender
    }

    pub fn receiver(&self) -> &Username {
        &self.receiver
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn body(&self) -> &EnvelopeBody {
        &self.body
    }

    /// Text of a chat envelope, `None` for files
    pub fn text(&self) -> Option<&MessageText> {
        match &self.body {
            EnvelopeBody::Chat { text } => Some(text),
            EnvelopeBody::File(_) => None,
        }
    }
}

fn required_username(
    value: Option<String>,
    field: &'static str,
) -> Result<Username, EnvelopeError> {
    let value = value.ok_or(EnvelopeError::MissingField(field))?;
    Username::new(value).map_err(|source| EnvelopeError::InvalidField { field, source })
}
