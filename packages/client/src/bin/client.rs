//! Interactive chat client for the Parlor relay.
//!
//! Joins the two-party room shared with `--peer` (or the room given by `--room`),
//! sends each line typed at the prompt as a chat message and prints everything
//! the room relays, including our own echoes.
//! Reconnects on disconnection (max 5 attempts with a growing delay).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parlor-client -- --username alice --peer bob
//! cargo run --bin parlor-client -- -n bob -P alice --url ws://127.0.0.1:3000
//! ```

use clap::Parser;

use parlor_client::{ClientConfig, run_client};
use parlor_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "parlor-client")]
#[command(about = "Interactive chat client for the Parlor relay", long_about = None)]
struct Args {
    /// Your username
    #[arg(short = 'n', long)]
    username: String,

    /// Username of the person you are talking to
    #[arg(short = 'P', long)]
    peer: String,

    /// Join this room instead of the one derived from both usernames
    #[arg(short = 'r', long)]
    room: Option<String>,

    /// Relay base URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080")]
    url: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let result = match ClientConfig::new(args.url, args.username, args.peer, args.room) {
        Ok(config) => run_client(config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
