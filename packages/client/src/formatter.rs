//! Message formatting utilities for client display.

use parlor_server::infrastructure::dto::websocket::OutboundEnvelope;

const RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format an envelope relayed by the server
    ///
    /// Envelopes sent by `current_user` come back as echoes and are marked "(me)".
    pub fn format_envelope(envelope: &OutboundEnvelope, current_user: &str) -> String {
        let me_suffix = if envelope.sender() == current_user {
            " (me)"
        } else {
            ""
        };
        match envelope {
            OutboundEnvelope::Chat {
                message,
                sender,
                timestamp,
                ..
            } => format!(
                "\n\n{RULE}\n@{}{}: {}\nsent at {}\n{RULE}\n",
                sender, me_suffix, message, timestamp
            ),
            OutboundEnvelope::File {
                message,
                sender,
                file_type,
                file_url,
                file_size,
                timestamp,
                ..
            } => format!(
                "\n\n{RULE}\n@{}{} shared a file: {} ({}, {} bytes)\n{}\nsent at {}\n{RULE}\n",
                sender, me_suffix, message, file_type, file_size, file_url, timestamp
            ),
        }
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
