//! InMemory Message Store 実装
//!
//! ドメイン層が定義する MessageStore trait の具体的な実装。
//! Vec をインメモリのメッセージログとして使用します（プロセス終了で消えます）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{MessageStore, NewMessageRecord, PersistedMessage, RoomId, StoreError};

#[derive(Default)]
struct LogState {
    next_id: i64,
    by_room: HashMap<RoomId, Vec<PersistedMessage>>,
}

/// インメモリ Message Store 実装
#[derive(Default)]
pub struct InMemoryMessageStore {
    state: Mutex<LogState>,
}

impl InMemoryMessageStore {
    /// 新しい InMemoryMessageStore を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みメッセージの総数
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.by_room.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, record: NewMessageRecord) -> Result<PersistedMessage, StoreError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let persisted = PersistedMessage {
            id: state.next_id,
            room_id: record.room_id,
            text: record.text,
            sender: record.sender.username,
            receiver: record.receiver.username,
            timestamp: record.timestamp,
        };
        state
            .by_room
            .entry(persisted.room_id.clone())
            .or_default()
            .push(persisted.clone());
        Ok(persisted)
    }

    async fn list_by_room(&self, room_id: &RoomId) -> Result<Vec<PersistedMessage>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.by_room.get(room_id).cloned().unwrap_or_default())
    }
}
