//! WebSocket chat relay server implementation.

pub mod coordinator;
mod handler;
mod server;
mod signal;
pub mod state;

pub use coordinator::{
    ConnectionOutcome, DisconnectReason, InboundFrame, RelayCoordinator, RelaySettings,
};
pub use server::Server;
