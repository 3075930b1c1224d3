//! UseCase: メッセージ中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayMessageUseCase::execute() メソッド
//! - 下書きの検証、タイムスタンプ付与、ルームへの配信、永続化の依頼
//!
//! ### なぜこのテストが必要か
//! - 送信者自身を含むルームの全メンバーに届くことを保証
//! - 不正なエンベロープが配信も永続化もされないことを確認
//! - 永続化の失敗が配信を妨げないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：チャット・ファイルの配信
//! - 異常系：必須フィールド欠落、送信者のなりすまし、閉じたセッション
//! - エッジケース：ストア障害時の配信

use std::sync::Arc;

use parlor_shared::time::Clock;

use crate::domain::{
    DeliveryReport, Envelope, EnvelopeDraft, EnvelopeKind, RegistryError, RoomId, RoomRegistry,
    Session, Timestamp,
};

use super::{error::RelayError, persist_message::PersistMessageUseCase};

/// メッセージ中継のユースケース
pub struct RelayMessageUseCase {
    /// RoomRegistry（ルームメンバー管理・配信の抽象化）
    registry: Arc<dyn RoomRegistry>,
    /// Persistence Writer（非同期の永続化）
    persister: Arc<PersistMessageUseCase>,
    /// 受信時刻の採番に使う時計
    clock: Arc<dyn Clock>,
}

impl RelayMessageUseCase {
    /// 新しい RelayMessageUseCase を作成
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        persister: Arc<PersistMessageUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            persister,
            clock,
        }
    }

    /// メッセージ中継を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 接続が紐づいているルーム（エンベロープ側では指定できない）
    /// * `session` - 送信元のセッション（ID は認証済み）
    /// * `draft` - 受信した未検証のエンベロープ
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryReport)` - 配信結果
    /// * `Err(RelayError)` - エンベロープを破棄した
    pub async fn execute(
        &self,
        room_id: &RoomId,
        session: &Session,
        draft: EnvelopeDraft,
    ) -> Result<DeliveryReport, RelayError> {
        if session.is_closed() {
            return Err(RelayError::SessionClosed(session.id().to_string()));
        }

        // 1. 検証とタイムスタンプ付与
        let timestamp = Timestamp::new(self.clock.now_millis());
        let envelope = Arc::new(Envelope::validate(
            draft,
            room_id.clone(),
            session.identity(),
            timestamp,
        )?);

        // 2. 送信者を含むルームの全メンバーへ配信（所属の確認も同時に行う）
        let report = self
            .registry
            .broadcast(room_id, &session.id(), envelope.clone())
            .await
            .map_err(|e| match e {
                RegistryError::NotAMember { session_id, room_id } => {
                    RelayError::NotAMember { session_id, room_id }
                }
                RegistryError::SessionClosed(session_id) => RelayError::SessionClosed(session_id),
            })?;

        // 3. 永続化を依頼（完了は待たない）
        if envelope.kind() == EnvelopeKind::Chat {
            self.persister.dispatch(envelope);
        }

        tracing::debug!(
            "Relayed message from '{}' in room '{}' to {} session(s), {} evicted",
            session.identity(),
            room_id,
            report.delivered,
            report.failed.len()
        );

        Ok(report)
    }
}
