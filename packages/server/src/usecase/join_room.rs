//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::open_session() / execute() メソッド
//! - セッションの生成（ID 採番、接続時刻）とルームへの登録
//!
//! ### なぜこのテストが必要か
//! - 参加したセッションだけが配信対象になることを保証
//! - 閉じたセッションが参加できないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規セッションの参加
//! - 異常系：閉じたセッションの参加試行
//! - エッジケース：別ルームへの再参加（元のルームから離脱）

use std::sync::Arc;

use parlor_shared::time::Clock;

use crate::domain::{
    OutboundReceiver, RoomId, RoomRegistry, Session, SessionIdFactory, Timestamp, Username,
};

use super::error::JoinError;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// RoomRegistry（ルームメンバー管理の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// 接続時刻の採番に使う時計
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(registry: Arc<dyn RoomRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// 接続済みの ID に対する新しいセッションを作成
    ///
    /// 戻り値の受信側は接続の書き込みタスクが所有します。
    pub fn open_session(
        &self,
        identity: Username,
        outbound_capacity: usize,
    ) -> (Arc<Session>, OutboundReceiver) {
        let (session, receiver) = Session::new(
            SessionIdFactory::generate(),
            identity,
            Timestamp::new(self.clock.now_millis()),
            outbound_capacity,
        );
        (Arc::new(session), receiver)
    }

    /// ルーム参加を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Some(RoomId))` - 別のルームから移動した場合、離脱したルーム
    /// * `Ok(None)` - 新規参加（または同じルームへの再参加）
    /// * `Err(JoinError)` - 参加失敗
    pub async fn execute(
        &self,
        room_id: &RoomId,
        session: Arc<Session>,
    ) -> Result<Option<RoomId>, JoinError> {
        let session_id = session.id();
        let identity = session.identity().clone();
        let previous = self.registry.join(room_id, session).await?;

        tracing::info!(
            "'{}' joined room '{}' (session {})",
            identity,
            room_id,
            session_id
        );
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::RegistryError, infrastructure::registry::InMemoryRoomRegistry};
    use parlor_shared::time::ManualClock;

    fn create_usecase() -> (JoinRoomUseCase, Arc<InMemoryRoomRegistry>) {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let clock = Arc::new(ManualClock::new(1_000));
        (JoinRoomUseCase::new(registry.clone(), clock), registry)
    }

    fn name(value: &str) -> Username {
        Username::new(value.to_string()).unwrap()
    }

    fn room(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_open_session_uses_clock_and_capacity() {
        // テスト項目: セッションの接続時刻は時計から、容量は指定値になる
        // given (前提条件):
        let (usecase, _registry) = create_usecase();

        // when (操作):
        let (session, _receiver) = usecase.open_session(name("alice"), 16);

        // then (期待する結果):
        assert_eq!(session.connected_at(), Timestamp::new(1_000));
        assert_eq!(session.capacity(), 16);
        assert_eq!(session.identity().as_str(), "alice");
        assert!(!session.is_closed());
    }

    #[tokio::test]
    async fn test_join_success() {
        // テスト項目: 参加したセッションがルームのメンバーになる
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let (session, _receiver) = usecase.open_session(name("alice"), 16);

        // when (操作):
        let result = usecase.execute(&room("alice_bob"), session.clone()).await;

        // then (期待する結果):
        assert_eq!(result, Ok(None));
        let members = registry.members(&room("alice_bob")).await;
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].session_id, session.id());
    }

    #[tokio::test]
    async fn test_join_moves_between_rooms() {
        // テスト項目: 別のルームに参加すると元のルームが返される
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let (session, _receiver) = usecase.open_session(name("alice"), 16);
        usecase.execute(&room("first"), session.clone()).await.unwrap();

        // when (操作):
        let result = usecase.execute(&room("second"), session.clone()).await;

        // then (期待する結果):
        assert_eq!(result, Ok(Some(room("first"))));
        assert!(registry.members(&room("first")).await.is_empty());
    }

    #[tokio::test]
    async fn test_join_closed_session_fails() {
        // テスト項目: 閉じたセッションの参加は JoinError になる
        // given (前提条件):
        let (usecase, _registry) = create_usecase();
        let (session, _receiver) = usecase.open_session(name("alice"), 16);
        session.close();

        // when (操作):
        let result = usecase.execute(&room("alice_bob"), session.clone()).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinError::Registry(RegistryError::SessionClosed(
                session.id().to_string()
            )))
        );
    }
}
