//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use std::time::Duration;

use parlor_server::domain::{RoomId, Username};

use crate::error::ClientError;

/// Base delay between reconnection attempts (multiplied by the attempt number)
pub const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Check if the client should exit immediately based on the error type.
///
/// A rejected connection will be rejected again, so retrying is pointless.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::Rejected(_) | ClientError::InvalidInput(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}

/// Linear backoff: 1 s before the first retry, 2 s before the second, ...
pub fn reconnect_delay(attempt: u32) -> Duration {
    RECONNECT_BASE_DELAY * attempt.max(1)
}

/// Room to join: an explicit room name wins, otherwise the two-party room
/// shared with `peer`.
pub fn resolve_room(
    username: &Username,
    peer: &Username,
    room: Option<&str>,
) -> Result<RoomId, ClientError> {
    let result = match room {
        Some(room) => RoomId::new(room.to_string()),
        None => RoomId::for_participants(username, peer),
    };
    result.map_err(|e| ClientError::InvalidInput(e.to_string()))
}

/// WebSocket URL of a room on the relay at `base_url` (e.g. `ws://127.0.0.1:8080`)
pub fn room_url(base_url: &str, room_id: &RoomId, username: &Username) -> String {
    format!(
        "{}/ws/chat/{}?username={}",
        base_url.trim_end_matches('/'),
        room_id,
        username
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(value: &str) -> Username {
        Username::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_should_exit_immediately_when_rejected() {
        // テスト項目: 接続が拒否された場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::Rejected("400 Bad Request".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_exit_immediately_with_connection_error() {
        // テスト項目: ConnectionError の場合、即座に終了すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_when_rejected() {
        // テスト項目: 接続が拒否された場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::Rejected("400 Bad Request".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 再接続回数が上限未満の場合、再接続すべきと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 4, 5);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_attempt_reconnect_at_limit() {
        // テスト項目: 再接続回数が上限に達した場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 5, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_reconnect_delay_is_linear() {
        // テスト項目: 再接続の待ち時間は試行回数に比例する
        assert_eq!(reconnect_delay(1), Duration::from_secs(1));
        assert_eq!(reconnect_delay(3), Duration::from_secs(3));
        assert_eq!(reconnect_delay(0), Duration::from_secs(1));
    }

    #[test]
    fn test_resolve_room_from_peer_is_symmetric() {
        // テスト項目: 相手から導いたルーム名はどちら側から見ても同じ
        // given (前提条件):
        let alice = name("alice");
        let bob = name("bob");

        // when (操作):
        let from_alice = resolve_room(&alice, &bob, None).unwrap();
        let from_bob = resolve_room(&bob, &alice, None).unwrap();

        // then (期待する結果):
        assert_eq!(from_alice, from_bob);
        assert_eq!(from_alice.as_str(), "aliceandbob");
    }

    #[test]
    fn test_resolve_room_explicit_name_wins() {
        // テスト項目: ルーム名を明示した場合はそれが使われ、不正な名前はエラー
        // given (前提条件):
        let alice = name("alice");
        let bob = name("bob");

        // when (操作):
        let explicit = resolve_room(&alice, &bob, Some("lobby"));
        let invalid = resolve_room(&alice, &bob, Some("a/b"));

        // then (期待する結果):
        assert_eq!(explicit.unwrap().as_str(), "lobby");
        assert!(matches!(invalid, Err(ClientError::InvalidInput(_))));
    }

    #[test]
    fn test_room_url() {
        // テスト項目: 接続先 URL にルーム名とユーザー名が含まれる
        // given (前提条件):
        let room = RoomId::new("aliceandbob".to_string()).unwrap();

        // when (操作):
        let url = room_url("ws://127.0.0.1:8080/", &room, &name("alice"));

        // then (期待する結果):
        assert_eq!(url, "ws://127.0.0.1:8080/ws/chat/aliceandbob?username=alice");
    }
}
