//! Infrastructure layer: wire DTOs, the room registry and message stores.

pub mod dto;
pub mod registry;
pub mod repository;
