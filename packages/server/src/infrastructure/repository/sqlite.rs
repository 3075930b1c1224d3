//! SQLite 実装（sqlx）
//!
//! MessageStore と UserDirectory の両方を 1 つのコネクションプールで実装します。
//!
//! ```text
//! users(id, username)
//! messages(id, room_name, message, sender_id, receiver_id, timestamp)
//! ```
//!
//! `timestamp` はリレーが割り当てた Unix ミリ秒です。

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    Row,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
};

use crate::domain::{
    DirectoryError, MessageStore, NewMessageRecord, PersistedMessage, RoomId, StoreError,
    Timestamp, UserDirectory, UserRecord, Username,
};

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE
)
"#;

const CREATE_MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    room_name TEXT NOT NULL,
    message TEXT NOT NULL,
    sender_id INTEGER NOT NULL REFERENCES users(id),
    receiver_id INTEGER NOT NULL REFERENCES users(id),
    timestamp INTEGER NOT NULL
)
"#;

const CREATE_MESSAGES_ROOM_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_messages_room_name ON messages (room_name, timestamp)";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => StoreError::Rejected(db.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::CorruptRecord(e.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        DirectoryError::Unavailable(e.to_string())
    }
}

/// SQLite を使った MessageStore / UserDirectory 実装
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// データベースに接続し、テーブルを作成する
    ///
    /// `sqlite::memory:` を渡すとプロセス内のみのデータベースになります。
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // インメモリ DB は接続ごとに別物になるため 1 本の接続を使い回す
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for statement in [
            CREATE_USERS_TABLE,
            CREATE_MESSAGES_TABLE,
            CREATE_MESSAGES_ROOM_INDEX,
        ] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("SQLite schema is ready");
        Ok(())
    }

    /// ユーザーを登録（登録済みなら既存のレコードを返す）
    pub async fn register_user(&self, username: &Username) -> Result<UserRecord, StoreError> {
        sqlx::query("INSERT OR IGNORE INTO users (username) VALUES (?)")
            .bind(username.as_str())
            .execute(&self.pool)
            .await?;
        let id: i64 = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(username.as_str())
            .fetch_one(&self.pool)
            .await?
            .try_get("id")?;
        Ok(UserRecord {
            id,
            username: username.clone(),
        })
    }
}

fn message_from_row(row: &SqliteRow) -> Result<PersistedMessage, StoreError> {
    let corrupt = |e: crate::domain::ValueObjectError| StoreError::CorruptRecord(e.to_string());
    Ok(PersistedMessage {
        id: row.try_get("id")?,
        room_id: RoomId::new(row.try_get("room_name")?).map_err(corrupt)?,
        text: row.try_get("message")?,
        sender: Username::new(row.try_get("sender")?).map_err(corrupt)?,
        receiver: Username::new(row.try_get("receiver")?).map_err(corrupt)?,
        timestamp: Timestamp::new(row.try_get("timestamp")?),
    })
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn append(&self, record: NewMessageRecord) -> Result<PersistedMessage, StoreError> {
        let id = sqlx::query(
            "INSERT INTO messages (room_name, message, sender_id, receiver_id, timestamp) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(record.room_id.as_str())
        .bind(&record.text)
        .bind(record.sender.id)
        .bind(record.receiver.id)
        .bind(record.timestamp.value())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(PersistedMessage {
            id,
            room_id: record.room_id,
            text: record.text,
            sender: record.sender.username,
            receiver: record.receiver.username,
            timestamp: record.timestamp,
        })
    }

    async fn list_by_room(&self, room_id: &RoomId) -> Result<Vec<PersistedMessage>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.room_name, m.message, s.username AS sender, r.username AS receiver, m.timestamp
            FROM messages m
            JOIN users s ON s.id = m.sender_id
            JOIN users r ON r.id = m.receiver_id
            WHERE m.room_name = ?
            ORDER BY m.timestamp ASC, m.id ASC
            "#,
        )
        .bind(room_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(message_from_row).collect()
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn resolve(&self, username: &Username) -> Result<Option<UserRecord>, DirectoryError> {
        let row = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(UserRecord {
                id: row.try_get("id")?,
                username: username.clone(),
            })),
            None => Ok(None),
        }
    }
}
