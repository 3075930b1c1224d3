//! Shared application state.

use std::sync::Arc;

use crate::usecase::{GetMessageHistoryUseCase, GetRoomDetailUseCase, GetRoomsUseCase};

use super::coordinator::RelayCoordinator;

/// Shared application state
pub struct AppState {
    /// RelayCoordinator（接続ごとのライフサイクル管理）
    pub relay_coordinator: RelayCoordinator,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// GetMessageHistoryUseCase（メッセージ履歴取得のユースケース）
    pub get_message_history_usecase: Arc<GetMessageHistoryUseCase>,
}
