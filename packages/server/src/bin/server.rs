//! WebSocket chat relay server.
//!
//! Clients join a room and every message is broadcast to all members of that
//! room, sender included, then written to the message log in the background.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parlor-server
//! cargo run --bin parlor-server -- --host 0.0.0.0 --port 3000 --user alice --user bob
//! cargo run --bin parlor-server -- --database-url sqlite://parlor.db --user alice --user bob
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use parlor_server::{
    domain::{MessageStore, UserDirectory, Username},
    infrastructure::{
        registry::InMemoryRoomRegistry,
        repository::{InMemoryMessageStore, InMemoryUserDirectory, SqliteStore},
    },
    ui::{RelaySettings, Server},
    usecase::{
        GetMessageHistoryUseCase, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
        LeaveRoomUseCase, PersistMessageUseCase, RelayMessageUseCase,
    },
};
use parlor_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "parlor-server")]
#[command(about = "WebSocket chat relay with per-room broadcast", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// SQLite database URL for the message log (in-memory store when omitted)
    #[arg(long)]
    database_url: Option<String>,

    /// Register a user in the identity directory (repeatable)
    #[arg(short = 'u', long = "user", value_parser = parse_username)]
    users: Vec<Username>,

    /// Capacity of each connection's outbound queue
    #[arg(long, default_value_t = 256)]
    queue_capacity: usize,

    /// Time a disconnecting connection gets to flush queued messages
    #[arg(long, default_value_t = 5000)]
    drain_timeout_ms: u64,
}

fn parse_username(value: &str) -> Result<Username, String> {
    Username::new(value.to_string()).map_err(|e| e.to_string())
}

/// Message log and identity directory backing the persistence writer
async fn create_stores(
    args: &Args,
) -> Result<(Arc<dyn MessageStore>, Arc<dyn UserDirectory>), Box<dyn std::error::Error>> {
    match &args.database_url {
        Some(url) => {
            let store = Arc::new(SqliteStore::connect(url).await?);
            for username in &args.users {
                let user = store.register_user(username).await?;
                tracing::info!("User '{}' registered (id {})", user.username, user.id);
            }
            tracing::info!("Using SQLite message log at {}", url);
            let message_store: Arc<dyn MessageStore> = store.clone();
            let directory: Arc<dyn UserDirectory> = store;
            Ok((message_store, directory))
        }
        None => {
            let message_store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
            let directory: Arc<dyn UserDirectory> =
                Arc::new(InMemoryUserDirectory::with_users(args.users.clone()));
            tracing::info!(
                "Using in-memory message log with {} user(s)",
                args.users.len()
            );
            Ok((message_store, directory))
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize dependencies in order:
    // 1. Registry / Stores
    // 2. UseCases
    // 3. Server

    // 1. Create Registry and Stores
    let registry = Arc::new(InMemoryRoomRegistry::new());
    let (store, directory) = create_stores(&args).await?;
    let clock = Arc::new(SystemClock);

    // 2. Create UseCases
    let persist_message_usecase = Arc::new(PersistMessageUseCase::new(store.clone(), directory));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(registry.clone(), clock.clone()));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(registry.clone()));
    let relay_message_usecase = Arc::new(RelayMessageUseCase::new(
        registry.clone(),
        persist_message_usecase,
        clock,
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(registry.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(registry));
    let get_message_history_usecase = Arc::new(GetMessageHistoryUseCase::new(store));

    // 3. Create and run the server
    let settings = RelaySettings {
        outbound_capacity: args.queue_capacity,
        drain_timeout: Duration::from_millis(args.drain_timeout_ms),
    };
    let server = Server::new(
        join_room_usecase,
        leave_room_usecase,
        relay_message_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
        get_message_history_usecase,
        settings,
    );
    server.run(args.host, args.port).await
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
