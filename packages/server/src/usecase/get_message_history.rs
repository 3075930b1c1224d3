//! UseCase: メッセージ履歴取得処理

use std::sync::Arc;

use crate::domain::{MessageStore, PersistedMessage, RoomId};

use super::error::GetHistoryError;

/// メッセージ履歴取得のユースケース
pub struct GetMessageHistoryUseCase {
    /// MessageStore（永続ログの抽象化）
    store: Arc<dyn MessageStore>,
}

impl GetMessageHistoryUseCase {
    /// 新しい GetMessageHistoryUseCase を作成
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// ルームの保存済みメッセージをタイムスタンプの昇順で取得
    ///
    /// 直前に中継されたメッセージが含まれる保証はありません（永続化は非同期）。
    pub async fn execute(&self, room_name: String) -> Result<Vec<PersistedMessage>, GetHistoryError> {
        let room_id =
            RoomId::new(room_name).map_err(|e| GetHistoryError::InvalidRoomId(e.to_string()))?;
        let mut messages = self
            .store
            .list_by_room(&room_id)
            .await
            .map_err(|e| GetHistoryError::Store(e.to_string()))?;
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockMessageStore, StoreError, Timestamp, Username};

    fn message(id: i64, timestamp: i64) -> PersistedMessage {
        PersistedMessage {
            id,
            room_id: RoomId::new("alice_bob".to_string()).unwrap(),
            text: format!("message {id}"),
            sender: Username::new("alice".to_string()).unwrap(),
            receiver: Username::new("bob".to_string()).unwrap(),
            timestamp: Timestamp::new(timestamp),
        }
    }

    #[tokio::test]
    async fn test_history_is_sorted_by_timestamp() {
        // テスト項目: 履歴はタイムスタンプの昇順で返される
        // given (前提条件):
        let mut store = MockMessageStore::new();
        store
            .expect_list_by_room()
            .times(1)
            .returning(|_| Ok(vec![message(3, 30), message(1, 10), message(2, 10)]));
        let usecase = GetMessageHistoryUseCase::new(Arc::new(store));

        // when (操作):
        let history = usecase.execute("alice_bob".to_string()).await.unwrap();

        // then (期待する結果):
        let ids: Vec<i64> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_history_with_invalid_room_name_fails() {
        // テスト項目: 不正なルーム名はストアに問い合わせずにエラーになる
        // given (前提条件):
        let mut store = MockMessageStore::new();
        store.expect_list_by_room().never();
        let usecase = GetMessageHistoryUseCase::new(Arc::new(store));

        // when (操作):
        let result = usecase.execute(String::new()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(GetHistoryError::InvalidRoomId(_))));
    }

    #[tokio::test]
    async fn test_history_store_failure() {
        // テスト項目: ストア障害は Store エラーになる
        // given (前提条件):
        let mut store = MockMessageStore::new();
        store
            .expect_list_by_room()
            .returning(|_| Err(StoreError::Unavailable("offline".to_string())));
        let usecase = GetMessageHistoryUseCase::new(Arc::new(store));

        // when (操作):
        let result = usecase.execute("alice_bob".to_string()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(GetHistoryError::Store(_))));
    }
}
