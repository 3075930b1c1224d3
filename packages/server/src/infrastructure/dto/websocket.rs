//! WebSocket envelope DTOs for the chat relay.

use serde::{Deserialize, Serialize};

/// Fields shared by every inbound envelope type.
///
/// Everything is optional at the wire level; required fields are checked
/// when the draft is validated into a domain envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    /// Accepted for compatibility; the relay assigns its own timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Envelope sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEnvelope {
    ChatMessage(InboundFields),
    FileMessage(InboundFields),
}

/// Envelope fanned out to every member of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEnvelope {
    Chat {
        message: String,
        sender: String,
        receiver: String,
        /// RFC 3339 (JST)
        timestamp: String,
    },
    File {
        message: String,
        sender: String,
        receiver: String,
        file_type: String,
        file_url: String,
        file_size: u64,
        /// RFC 3339 (JST)
        timestamp: String,
    },
}

impl OutboundEnvelope {
    pub fn sender(&self) -> &str {
        match self {
            OutboundEnvelope::Chat { sender, .. } | OutboundEnvelope::File { sender, .. } => sender,
        }
    }
}
