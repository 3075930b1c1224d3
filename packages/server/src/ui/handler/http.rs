//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::http::{HealthDto, MessageDto, RoomDetailDto, RoomSummaryDto},
    ui::state::AppState,
    usecase::{GetHistoryError, GetRoomDetailError},
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// Get list of rooms with live members
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(rooms.into_iter().map(Into::into).collect())
}

/// Get room detail by name
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_name): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state.get_room_detail_usecase.execute(room_name).await {
        Ok(room) => Ok(Json(room.into())),
        Err(GetRoomDetailError::InvalidRoomId(e)) => {
            tracing::debug!("Rejected room detail request: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
        Err(GetRoomDetailError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
    }
}

/// Get persisted message history of a room (ascending timestamp)
pub async fn get_message_history(
    State(state): State<Arc<AppState>>,
    Path(room_name): Path<String>,
) -> Result<Json<Vec<MessageDto>>, StatusCode> {
    match state.get_message_history_usecase.execute(room_name).await {
        Ok(messages) => Ok(Json(messages.into_iter().map(Into::into).collect())),
        Err(GetHistoryError::InvalidRoomId(e)) => {
            tracing::debug!("Rejected history request: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
        Err(GetHistoryError::Store(e)) => {
            tracing::error!("Failed to load message history: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
