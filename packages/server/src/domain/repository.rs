//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    entity::{DeliveryReport, MemberInfo, NewMessageRecord, PersistedMessage, RoomSnapshot, UserRecord},
    envelope::Envelope,
    error::{DirectoryError, RegistryError, StoreError},
    session::Session,
    value_object::{RoomId, SessionId, Username},
};

/// Room Registry trait
///
/// ルーム名と接続中セッションの対応を保持する。
/// 1 つのセッションは同時に高々 1 つのルームにのみ所属する。
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// セッションをルームに参加させる
    ///
    /// 既に別のルームに所属していた場合はそのルームから離脱させ、離脱元のルームを返す。
    async fn join(
        &self,
        room_id: &RoomId,
        session: Arc<Session>,
    ) -> Result<Option<RoomId>, RegistryError>;

    /// セッションをルームから離脱させる（冪等）
    ///
    /// 実際に離脱した場合のみ `true` を返す。メンバーがいなくなったルームは削除される。
    async fn leave(&self, room_id: &RoomId, session_id: &SessionId) -> bool;

    /// `sender` が所属するルームの全メンバーにエンベロープを配信する
    ///
    /// 所属の確認と配信は同じ操作の中で行われる。`sender` がルームに所属していない場合は
    /// 誰にも配信せず `RegistryError::NotAMember` を返す。
    /// 受け付けられなかったセッションはルームから除外される。
    async fn broadcast(
        &self,
        room_id: &RoomId,
        sender: &SessionId,
        envelope: Arc<Envelope>,
    ) -> Result<DeliveryReport, RegistryError>;

    /// セッションが所属するルームを取得
    async fn room_of(&self, session_id: &SessionId) -> Option<RoomId>;

    /// ルームのメンバー一覧を取得（接続時刻順）
    async fn members(&self, room_id: &RoomId) -> Vec<MemberInfo>;

    /// メンバーのいる全ルームを取得（ルーム名順）
    async fn rooms(&self) -> Vec<RoomSnapshot>;
}

/// Message Store trait
///
/// チャットメッセージの永続ログ。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// メッセージを追記
    async fn append(&self, record: NewMessageRecord) -> Result<PersistedMessage, StoreError>;

    /// ルームのメッセージを取得（保存順）
    async fn list_by_room(&self, room_id: &RoomId) -> Result<Vec<PersistedMessage>, StoreError>;
}

/// User Directory trait
///
/// ユーザー名から永続化用のユーザー ID を解決する外部協調者。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// ユーザー名を解決（未登録の場合は `Ok(None)`）
    async fn resolve(&self, username: &Username) -> Result<Option<UserRecord>, DirectoryError>;
}
