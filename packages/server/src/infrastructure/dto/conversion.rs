//! Conversion logic between DTOs and domain entities.

use parlor_shared::time::timestamp_to_jst_rfc3339;

use crate::domain::{
    Envelope, EnvelopeBody, EnvelopeDraft, EnvelopeError, EnvelopeKind, MemberInfo,
    PersistedMessage, RoomSnapshot,
};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain
// ========================================

/// Parse an inbound text frame into an unvalidated draft.
///
/// # Errors
///
/// Returns [`EnvelopeError::Malformed`] when the text is not JSON or names an
/// unknown envelope type.
pub fn parse_inbound(text: &str) -> Result<EnvelopeDraft, EnvelopeError> {
    serde_json::from_str::<dto::InboundEnvelope>(text)
        .map(EnvelopeDraft::from)
        .map_err(|e| EnvelopeError::Malformed(e.to_string()))
}

impl From<dto::InboundEnvelope> for EnvelopeDraft {
    fn from(dto: dto::InboundEnvelope) -> Self {
        let (kind, fields) = match dto {
            dto::InboundEnvelope::ChatMessage(fields) => (EnvelopeKind::Chat, fields),
            dto::InboundEnvelope::FileMessage(fields) => (EnvelopeKind::File, fields),
        };
        Self {
            kind,
            message: fields.message,
            sender: fields.sender,
            receiver: fields.receiver,
            file_url: fields.file_url,
            file_type: fields.file_type,
            file_size: fields.file_size,
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&Envelope> for dto::OutboundEnvelope {
    fn from(model: &Envelope) -> Self {
        let sender = model.sender().to_string();
        let receiver = model.receiver().to_string();
        let timestamp = timestamp_to_jst_rfc3339(model.timestamp().value());
        match model.body() {
            EnvelopeBody::Chat { text } => Self::Chat {
                message: text.to_string(),
                sender,
                receiver,
                timestamp,
            },
            EnvelopeBody::File(file) => Self::File {
                message: file.caption.clone(),
                sender,
                receiver,
                file_type: file.mime_type.as_str().to_string(),
                file_url: file.url.as_str().to_string(),
                file_size: file.size,
                timestamp,
            },
        }
    }
}

impl From<MemberInfo> for http::ParticipantDetailDto {
    fn from(model: MemberInfo) -> Self {
        Self {
            username: model.username.into_string(),
            session_id: model.session_id.to_string(),
            connected_at: timestamp_to_jst_rfc3339(model.connected_at.value()),
        }
    }
}

impl From<RoomSnapshot> for http::RoomSummaryDto {
    fn from(model: RoomSnapshot) -> Self {
        Self {
            id: model.id.into_string(),
            participants: model
                .members
                .into_iter()
                .map(|member| member.username.into_string())
                .collect(),
        }
    }
}

impl From<RoomSnapshot> for http::RoomDetailDto {
    fn from(model: RoomSnapshot) -> Self {
        Self {
            id: model.id.into_string(),
            participants: model.members.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<PersistedMessage> for http::MessageDto {
    fn from(model: PersistedMessage) -> Self {
        Self {
            id: model.id,
            room_name: model.room_id.into_string(),
            message: model.text,
            sender: model.sender.into_string(),
            receiver: model.receiver.into_string(),
            timestamp: timestamp_to_jst_rfc3339(model.timestamp.value()),
        }
    }
}
