//! UseCase: ルーム離脱処理

use std::sync::Arc;

use crate::domain::{RoomId, RoomRegistry, SessionId};

/// ルーム離脱のユースケース
pub struct LeaveRoomUseCase {
    /// RoomRegistry（ルームメンバー管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// ルーム離脱を実行（冪等）
    ///
    /// 配信失敗で既に除外されていた場合も含め、離脱後はルームのメンバーではありません。
    /// 実際にメンバーから取り除いた場合のみ `true` を返します。
    pub async fn execute(&self, room_id: &RoomId, session_id: &SessionId) -> bool {
        let removed = self.registry.leave(room_id, session_id).await;
        if removed {
            tracing::info!("Session {} left room '{}'", session_id, room_id);
        } else {
            tracing::debug!(
                "Session {} was no longer a member of room '{}'",
                session_id,
                room_id
            );
        }
        removed
    }
}
