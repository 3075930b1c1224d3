//! Client execution logic with reconnection support.

use parlor_server::domain::{RoomId, Username};

use crate::{
    domain::{reconnect_delay, resolve_room, room_url, should_attempt_reconnect},
    error::ClientError,
    session::run_client_session,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Who we are, who we talk to and where
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay base URL, e.g. `ws://127.0.0.1:8080`
    pub url: String,
    pub username: Username,
    pub peer: Username,
    pub room: RoomId,
}

impl ClientConfig {
    /// Build a config from raw command line values.
    ///
    /// Without an explicit `room` the client joins the two-party room shared with `peer`.
    pub fn new(
        url: String,
        username: String,
        peer: String,
        room: Option<String>,
    ) -> Result<Self, ClientError> {
        let username =
            Username::new(username).map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        let peer = Username::new(peer).map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        let room = resolve_room(&username, &peer, room.as_deref())?;
        Ok(Self {
            url,
            username,
            peer,
            room,
        })
    }

    pub fn ws_url(&self) -> String {
        room_url(&self.url, &self.room, &self.username)
    }
}

/// Run the WebSocket client with reconnection logic
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            config.ws_url(),
            config.username,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&config).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                reconnect_count += 1;
                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!("Giving up after {} attempt(s): {}", reconnect_count, e);
                    return Err(e);
                }

                let delay = reconnect_delay(reconnect_count);
                tracing::warn!(
                    "Connection lost: {}. Reconnecting in {:?}... (attempt {}/{})",
                    e,
                    delay,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_derives_two_party_room() {
        // テスト項目: ルーム未指定の場合は二者のルーム名が導出される
        // given (前提条件):
        let url = "ws://127.0.0.1:8080".to_string();

        // when (操作):
        let config =
            ClientConfig::new(url, "bob".to_string(), "alice".to_string(), None).unwrap();

        // then (期待する結果):
        assert_eq!(config.room.as_str(), "aliceandbob");
        assert_eq!(
            config.ws_url(),
            "ws://127.0.0.1:8080/ws/chat/aliceandbob?username=bob"
        );
    }

    #[test]
    fn test_config_rejects_empty_username() {
        // テスト項目: 空のユーザー名は InvalidInput になる
        // given (前提条件):
        let url = "ws://127.0.0.1:8080".to_string();

        // when (操作):
        let result = ClientConfig::new(url, "".to_string(), "alice".to_string(), None);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::InvalidInput(_))));
    }
}
