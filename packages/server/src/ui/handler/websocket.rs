//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, future};
use serde::Deserialize;

use crate::{
    domain::{RoomId, Username},
    ui::{coordinator::InboundFrame, state::AppState},
};

/// Query parameters for WebSocket connection
///
/// `username` is the identity established by the fronting auth layer.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub username: Option<String>,
}

impl From<Message> for InboundFrame {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(text) => InboundFrame::Text(text.as_str().to_owned()),
            Message::Binary(bytes) => InboundFrame::Binary(bytes.len()),
            Message::Ping(_) | Message::Pong(_) => InboundFrame::Control,
            Message::Close(_) => InboundFrame::Close,
        }
    }
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_name): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> RoomId (Domain Model)
    let room_id = match RoomId::try_from(room_name.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid room name '{}': {}", room_name, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Convert String -> Username (Domain Model)
    let identity = match query.username.map(Username::try_from) {
        Some(Ok(identity)) => identity,
        Some(Err(e)) => {
            tracing::warn!("Invalid username for room '{}': {}", room_id, e);
            return Err(StatusCode::BAD_REQUEST);
        }
        None => {
            tracing::warn!("Connection to room '{}' without identity", room_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    tracing::info!("'{}' is connecting to room '{}'", identity, room_id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, identity)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_id: RoomId, identity: Username) {
    let (sender, receiver) = socket.split();

    let inbound = receiver.map(|frame| frame.map(InboundFrame::from));
    let outbound = sender.with(|text: String| {
        future::ready(Ok::<_, axum::Error>(Message::Text(text.into())))
    });

    let outcome = state
        .relay_coordinator
        .run(room_id, identity, inbound, outbound)
        .await;

    tracing::info!(
        "Session {} closed ({}): relayed {}, dropped {}",
        outcome.session_id,
        outcome.reason,
        outcome.relayed,
        outcome.dropped
    );
}
