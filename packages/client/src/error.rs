//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The relay refused the connection (bad room name or identity)
    #[error("Connection rejected by the server: {0}")]
    Rejected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Invalid command line or input line
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
