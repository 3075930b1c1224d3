//! InMemory User Directory 実装
//!
//! 起動時に登録されたユーザーのみを解決します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{DirectoryError, UserDirectory, UserRecord, Username};

/// インメモリ User Directory 実装
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Username, UserRecord>>,
}

impl InMemoryUserDirectory {
    /// 新しい InMemoryUserDirectory を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ユーザー名のリストから作成（ID は 1 から順に採番）
    pub fn with_users(usernames: impl IntoIterator<Item = Username>) -> Self {
        let users = usernames
            .into_iter()
            .enumerate()
            .map(|(index, username)| {
                let record = UserRecord {
                    id: index as i64 + 1,
                    username: username.clone(),
                };
                (username, record)
            })
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    /// ユーザーを登録（登録済みなら既存のレコードを返す）
    pub async fn register(&self, username: Username) -> UserRecord {
        let mut users = self.users.write().await;
        let next_id = users.len() as i64 + 1;
        users
            .entry(username.clone())
            .or_insert(UserRecord {
                id: next_id,
                username,
            })
            .clone()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn resolve(&self, username: &Username) -> Result<Option<UserRecord>, DirectoryError> {
        let users = self.users.read().await;
        Ok(users.get(username).cloned())
    }
}
