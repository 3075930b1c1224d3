//! UseCase: ルーム詳細取得処理

use std::sync::Arc;

use crate::domain::{RoomId, RoomRegistry, RoomSnapshot};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl GetRoomDetailUseCase {
    /// 新しい GetRoomDetailUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルームの現在のメンバーを取得
    ///
    /// メンバーのいないルームは存在しないものとして扱います。
    pub async fn execute(&self, room_name: String) -> Result<RoomSnapshot, GetRoomDetailError> {
        let room_id = RoomId::new(room_name)
            .map_err(|e| GetRoomDetailError::InvalidRoomId(e.to_string()))?;
        let members = self.registry.members(&room_id).await;
        if members.is_empty() {
            return Err(GetRoomDetailError::RoomNotFound(room_id.into_string()));
        }
        Ok(RoomSnapshot {
            id: room_id,
            members,
        })
    }
}
