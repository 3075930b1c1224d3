//! Factories for generated identifiers.

use super::value_object::SessionId;

/// Generates unique SessionIds
pub struct SessionIdFactory;

impl SessionIdFactory {
    /// Generate a new random (v4) SessionId
    pub fn generate() -> SessionId {
        SessionId::from_uuid(uuid::Uuid::new_v4())
    }
}
