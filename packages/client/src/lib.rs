//! Interactive CLI client for the Parlor chat relay.

mod domain;
pub mod error;
mod formatter;
mod input;
mod runner;
mod session;
mod ui;

pub use runner::{ClientConfig, run_client};
