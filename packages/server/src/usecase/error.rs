//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{EnvelopeError, RegistryError};

/// ルーム参加時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// レジストリが参加を拒否した
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// メッセージ中継時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// 受信したエンベロープが不正（破棄される）
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(#[from] EnvelopeError),

    /// セッションは既に閉じられている
    #[error("session {0} is closed")]
    SessionClosed(String),

    /// セッションは接続先のルームに所属していない
    #[error("session {session_id} is not a member of room '{room_id}'")]
    NotAMember { session_id: String, room_id: String },
}

/// メッセージ永続化時のエラー（ログに記録するのみで伝播しない）
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// チャット以外のエンベロープは永続化しない
    #[error("envelope kind '{0}' is not persisted")]
    UnsupportedKind(String),

    /// 送信者または受信者をユーザーディレクトリで解決できない
    #[error("unknown identity '{0}'")]
    IdentityResolution(String),

    /// ユーザーディレクトリに到達できない
    #[error("user directory failed: {0}")]
    Directory(String),

    /// メッセージストアへの書き込みに失敗した
    #[error("message store failed: {0}")]
    Store(String),
}

/// メッセージ履歴取得時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GetHistoryError {
    #[error("invalid room name: {0}")]
    InvalidRoomId(String),

    #[error("message store failed: {0}")]
    Store(String),
}

/// ルーム詳細取得時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GetRoomDetailError {
    #[error("invalid room name: {0}")]
    InvalidRoomId(String),

    #[error("room '{0}' has no members")]
    RoomNotFound(String),
}
