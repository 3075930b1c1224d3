//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use parlor_server::infrastructure::dto::websocket::OutboundEnvelope;

use crate::{
    error::ClientError, formatter::MessageFormatter, input::parse_line, runner::ClientConfig,
    ui::redisplay_prompt,
};

/// Map a handshake failure to a client error.
///
/// A 4xx answer means the relay refused the room or the identity.
fn classify_connect_error(error: tungstenite::Error) -> ClientError {
    match error {
        tungstenite::Error::Http(response) if response.status().is_client_error() => {
            ClientError::Rejected(format!("HTTP {}", response.status()))
        }
        other => ClientError::ConnectionError(other.to_string()),
    }
}

/// Run one WebSocket client session until the user quits or the connection drops
pub async fn run_client_session(config: &ClientConfig) -> Result<(), ClientError> {
    let url = config.ws_url();

    let (ws_stream, _response) = connect_async(&url).await.map_err(classify_connect_error)?;

    tracing::info!("Connected to room '{}'", config.room);
    println!(
        "\nYou are '{}' in room '{}' talking to '{}'. Type messages and press Enter to send.\n\
         Use /file <url> <mime-type> [size] to share a file. Press Ctrl+C to exit.\n",
        config.username, config.room, config.peer
    );

    let (mut write, mut read) = ws_stream.split();

    let username_for_read = config.username.to_string();

    // Spawn a task to handle incoming messages
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let formatted = match serde_json::from_str::<OutboundEnvelope>(&text) {
                        Ok(envelope) => {
                            MessageFormatter::format_envelope(&envelope, &username_for_read)
                        }
                        Err(_) => MessageFormatter::format_raw_message(&text),
                    };
                    print!("{}", formatted);
                    redisplay_prompt(&username_for_read);
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&username_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    connection_error = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // rustyline is synchronous, so it gets its own thread
    let prompt = format!("{}> ", config.username);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let username = config.username.to_string();
    let peer = config.peer.to_string();
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(line) = input_rx.recv().await {
            let envelope = match parse_line(&line, &username, &peer) {
                Ok(envelope) => envelope,
                Err(e) => {
                    println!("{}", e);
                    redisplay_prompt(&username);
                    continue;
                }
            };

            let json = match serde_json::to_string(&envelope) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            // The relay echoes our own envelopes back, so no local confirmation here
            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                write_error = true;
                break;
            }
        }

        if !write_error {
            write.close().await.ok();
        }
        write_error
    });

    // If any one of the tasks completes, abort the other
    let connection_lost = tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            read_result.unwrap_or(false)
        }
        write_result = &mut write_task => {
            read_task.abort();
            write_result.unwrap_or(false)
        }
    };

    if connection_lost {
        return Err(ClientError::ConnectionError("Connection lost".to_string()));
    }
    Ok(())
}
