//! UseCase: メッセージ永続化処理（Persistence Writer）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PersistMessageUseCase::execute() / dispatch() メソッド
//! - 送信者・受信者の解決とメッセージストアへの書き込み
//!
//! ### なぜこのテストが必要か
//! - 永続化の失敗が配信に影響しないこと（呼び出し側へ伝播しないこと）を保証
//! - 未登録ユーザーやストア障害がエラーとして区別されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：チャットメッセージの保存
//! - 異常系：未登録の受信者、ストア障害
//! - エッジケース：ファイルメッセージ（保存対象外）

use std::sync::Arc;

use crate::domain::{
    Envelope, EnvelopeBody, MessageStore, NewMessageRecord, PersistedMessage, UserDirectory,
    UserRecord, Username,
};

use super::error::PersistError;

/// メッセージ永続化のユースケース
pub struct PersistMessageUseCase {
    /// MessageStore（永続ログの抽象化）
    store: Arc<dyn MessageStore>,
    /// UserDirectory（ユーザー ID 解決の抽象化）
    directory: Arc<dyn UserDirectory>,
}

impl PersistMessageUseCase {
    /// 新しい PersistMessageUseCase を作成
    pub fn new(store: Arc<dyn MessageStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// エンベロープの永続化をバックグラウンドで開始する（fire-and-forget）
    ///
    /// 結果は呼び出し側に返らず、失敗はログに記録されるだけです。
    pub fn dispatch(self: &Arc<Self>, envelope: Arc<Envelope>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match this.execute(&envelope).await {
                Ok(persisted) => tracing::debug!(
                    "Persisted message {} in room '{}'",
                    persisted.id,
                    persisted.room_id
                ),
                Err(e @ PersistError::Store(_)) => tracing::error!(
                    "Failed to persist message from '{}' in room '{}': {}",
                    envelope.sender(),
                    envelope.room_id(),
                    e
                ),
                Err(e) => tracing::warn!(
                    "Skipped persisting message from '{}' in room '{}': {}",
                    envelope.sender(),
                    envelope.room_id(),
                    e
                ),
            }
        });
    }

    /// エンベロープを永続化する
    ///
    /// # Returns
    ///
    /// * `Ok(PersistedMessage)` - 保存されたメッセージ
    /// * `Err(PersistError)` - 保存失敗
    pub async fn execute(&self, envelope: &Envelope) -> Result<PersistedMessage, PersistError> {
        let text = match envelope.body() {
            EnvelopeBody::Chat { text } => text.to_string(),
            EnvelopeBody::File(_) => {
                return Err(PersistError::UnsupportedKind(
                    envelope.kind().as_str().to_string(),
                ));
            }
        };

        // 1. 送信者・受信者をユーザーディレクトリで解決
        let sender = self.resolve(envelope.sender()).await?;
        let receiver = self.resolve(envelope.receiver()).await?;

        // 2. メッセージストアに追記
        let record = NewMessageRecord {
            room_id: envelope.room_id().clone(),
            text,
            sender,
            receiver,
            timestamp: envelope.timestamp(),
        };
        self.store
            .append(record)
            .await
            .map_err(|e| PersistError::Store(e.to_string()))
    }

    async fn resolve(&self, username: &Username) -> Result<UserRecord, PersistError> {
        self.directory
            .resolve(username)
            .await
            .map_err(|e| PersistError::Directory(e.to_string()))?
            .ok_or_else(|| PersistError::IdentityResolution(username.to_string()))
    }
}
