//! Turning prompt lines into outbound envelopes.
//!
//! ```text
//! hello there                      -> chat_message
//! /file <url> <mime-type> [size]   -> file_message
//! ```

use parlor_server::infrastructure::dto::websocket::{InboundEnvelope, InboundFields};

use crate::error::ClientError;

const FILE_COMMAND: &str = "/file";

/// Build the envelope for one line typed at the prompt.
pub fn parse_line(line: &str, sender: &str, receiver: &str) -> Result<InboundEnvelope, ClientError> {
    let fields = InboundFields {
        sender: Some(sender.to_string()),
        receiver: Some(receiver.to_string()),
        ..InboundFields::default()
    };

    let Some(args) = line.strip_prefix(FILE_COMMAND) else {
        return Ok(InboundEnvelope::ChatMessage(InboundFields {
            message: Some(line.to_string()),
            ..fields
        }));
    };
    if !args.is_empty() && !args.starts_with(char::is_whitespace) {
        // e.g. "/filed" is an ordinary chat line
        return Ok(InboundEnvelope::ChatMessage(InboundFields {
            message: Some(line.to_string()),
            ..fields
        }));
    }

    let mut parts = args.split_whitespace();
    let (Some(url), Some(mime_type)) = (parts.next(), parts.next()) else {
        return Err(ClientError::InvalidInput(
            "usage: /file <url> <mime-type> [size]".to_string(),
        ));
    };
    let size = parts
        .next()
        .map(|size| {
            size.parse::<i64>()
                .map_err(|_| ClientError::InvalidInput(format!("invalid file size: {}", size)))
        })
        .transpose()?;
    let caption = url.rsplit('/').next().unwrap_or(url).to_string();

    Ok(InboundEnvelope::FileMessage(InboundFields {
        message: Some(caption),
        file_url: Some(url.to_string()),
        file_type: Some(mime_type.to_string()),
        file_size: size,
        ..fields
    }))
}
