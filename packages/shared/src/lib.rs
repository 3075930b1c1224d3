//! Utilities shared by the Parlor relay server and its CLI client.

pub mod logger;
pub mod time;
