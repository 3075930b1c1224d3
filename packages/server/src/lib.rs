//! Parlor chat relay.
//!
//! Clients connect to a room over WebSocket; every accepted envelope is
//! stamped, fanned out to all members of the room and handed to the
//! persistence writer without waiting for it.

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
