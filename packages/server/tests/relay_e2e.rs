//! End-to-end tests: relay served on an ephemeral port, driven over real
//! WebSocket and HTTP connections.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use parlor_server::{
    domain::Username,
    infrastructure::{
        registry::InMemoryRoomRegistry,
        repository::{InMemoryMessageStore, InMemoryUserDirectory},
    },
    ui::{RelaySettings, Server},
    usecase::{
        GetMessageHistoryUseCase, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
        LeaveRoomUseCase, PersistMessageUseCase, RelayMessageUseCase,
    },
};
use parlor_shared::time::SystemClock;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, Message},
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: std::net::SocketAddr,
}

impl TestServer {
    async fn start() -> Self {
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let store = Arc::new(InMemoryMessageStore::new());
        let directory = Arc::new(InMemoryUserDirectory::with_users(
            ["alice", "bob"].map(|name| Username::new(name.to_string()).unwrap()),
        ));
        let clock = Arc::new(SystemClock);
        let persister = Arc::new(PersistMessageUseCase::new(store.clone(), directory));

        let server = Server::new(
            Arc::new(JoinRoomUseCase::new(registry.clone(), clock.clone())),
            Arc::new(LeaveRoomUseCase::new(registry.clone())),
            Arc::new(RelayMessageUseCase::new(registry.clone(), persister, clock)),
            Arc::new(GetRoomsUseCase::new(registry.clone())),
            Arc::new(GetRoomDetailUseCase::new(registry)),
            Arc::new(GetMessageHistoryUseCase::new(store)),
            RelaySettings::default(),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, server.router()).await.unwrap();
        });
        Self { addr }
    }

    fn ws_url(&self, room: &str, username: &str) -> String {
        format!("ws://{}/ws/chat/{}?username={}", self.addr, room, username)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn join(&self, room: &str, username: &str) -> Socket {
        let (socket, _response) = connect_async(self.ws_url(room, username)).await.unwrap();
        socket
    }

    async fn wait_for_members(&self, room: &str, count: usize) {
        let client = reqwest::Client::new();
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let response = client
                    .get(self.http_url(&format!("/api/rooms/{}", room)))
                    .send()
                    .await
                    .unwrap();
                if response.status() == 200 {
                    let body: serde_json::Value = response.json().await.unwrap();
                    if body["participants"].as_array().map(Vec::len) == Some(count) {
                        return;
                    }
                } else if count == 0 && response.status() == 404 {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }
}

async fn next_json(socket: &mut Socket) -> serde_json::Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_chat_message_is_relayed_and_persisted() {
    // テスト項目: alice の送信が bob と alice 自身に届き、永続化される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.join("alice_bob", "alice").await;
    let mut bob = server.join("alice_bob", "bob").await;
    server.wait_for_members("alice_bob", 2).await;

    // when (操作):
    alice
        .send(Message::Text(
            r#"{"type":"chat_message","message":"hi","sender":"alice","receiver":"bob"}"#.into(),
        ))
        .await
        .unwrap();

    // then (期待する結果):
    let received = next_json(&mut bob).await;
    assert_eq!(received["type"], "chat");
    assert_eq!(received["message"], "hi");
    assert_eq!(received["sender"], "alice");
    assert_eq!(received["receiver"], "bob");
    let echoed = next_json(&mut alice).await;
    assert_eq!(echoed, received);

    let client = reqwest::Client::new();
    let history = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let body: serde_json::Value = client
                .get(server.http_url("/api/messages/alice_bob"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if body.as_array().is_some_and(|messages| !messages.is_empty()) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(history[0]["sender"], "alice");
    assert_eq!(history[0]["receiver"], "bob");
    assert_eq!(history[0]["room_name"], "alice_bob");
    assert_eq!(history[0]["message"], "hi");
}

#[tokio::test]
async fn test_malformed_envelope_keeps_connection_open() {
    // テスト項目: 不正なエンベロープを送っても接続は維持され、次のメッセージは届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.join("alice_bob", "alice").await;
    let mut bob = server.join("alice_bob", "bob").await;
    server.wait_for_members("alice_bob", 2).await;

    // when (操作):
    alice
        .send(Message::Text(r#"{"type":"chat_message"}"#.into()))
        .await
        .unwrap();
    alice
        .send(Message::Text(
            r#"{"type":"chat_message","message":"after","sender":"alice","receiver":"bob"}"#.into(),
        ))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(next_json(&mut bob).await["message"], "after");
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    // テスト項目: 別のルームのメンバーにはメッセージが届かない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.join("alice_bob", "alice").await;
    let mut outsider = server.join("lobby", "bob").await;
    server.wait_for_members("alice_bob", 1).await;
    server.wait_for_members("lobby", 1).await;

    // when (操作):
    alice
        .send(Message::Text(
            r#"{"type":"chat_message","message":"private","sender":"alice","receiver":"bob"}"#.into(),
        ))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(next_json(&mut alice).await["message"], "private");
    let leaked = tokio::time::timeout(Duration::from_millis(200), outsider.next()).await;
    assert!(leaked.is_err(), "message leaked to another room: {:?}", leaked);
}

#[tokio::test]
async fn test_disconnect_removes_member() {
    // テスト項目: 切断したセッションはルームから外れ、空のルームは 404 になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.join("alice_bob", "alice").await;
    server.wait_for_members("alice_bob", 1).await;

    // when (操作):
    alice.close(None).await.unwrap();

    // then (期待する結果):
    server.wait_for_members("alice_bob", 0).await;
    let rooms: serde_json::Value = reqwest::get(server.http_url("/api/rooms"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rooms, serde_json::json!([]));
}

#[tokio::test]
async fn test_connection_without_identity_is_rejected() {
    // テスト項目: username のない接続は 400 で拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let url = format!("ws://{}/ws/chat/alice_bob", server.addr);

    // when (操作):
    let result = connect_async(url).await;

    // then (期待する結果):
    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 400),
        other => panic!("expected HTTP 400, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    // テスト項目: /api/health が ok を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = reqwest::get(server.http_url("/api/health")).await.unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
