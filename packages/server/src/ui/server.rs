//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::usecase::{
    GetMessageHistoryUseCase, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
    LeaveRoomUseCase, RelayMessageUseCase,
};

use super::{
    coordinator::{RelayCoordinator, RelaySettings},
    handler::{get_message_history, get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket chat relay server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     join_room_usecase,
///     leave_room_usecase,
///     relay_message_usecase,
///     get_rooms_usecase,
///     get_room_detail_usecase,
///     get_message_history_usecase,
///     RelaySettings::default(),
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// JoinRoomUseCase（ルーム参加のユースケース）
    join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム離脱のユースケース）
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// RelayMessageUseCase（メッセージ中継のユースケース）
    relay_message_usecase: Arc<RelayMessageUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// GetMessageHistoryUseCase（メッセージ履歴取得のユースケース）
    get_message_history_usecase: Arc<GetMessageHistoryUseCase>,
    /// 接続ごとのキュー容量とドレイン猶予
    settings: RelaySettings,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        relay_message_usecase: Arc<RelayMessageUseCase>,
        get_rooms_usecase: Arc<GetRoomsUseCase>,
        get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
        get_message_history_usecase: Arc<GetMessageHistoryUseCase>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            join_room_usecase,
            leave_room_usecase,
            relay_message_usecase,
            get_rooms_usecase,
            get_room_detail_usecase,
            get_message_history_usecase,
            settings,
        }
    }

    /// Build the application router
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            relay_coordinator: RelayCoordinator::new(
                self.join_room_usecase,
                self.leave_room_usecase,
                self.relay_message_usecase,
                self.settings,
            ),
            get_rooms_usecase: self.get_rooms_usecase,
            get_room_detail_usecase: self.get_room_detail_usecase,
            get_message_history_usecase: self.get_message_history_usecase,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws/chat/{room_name}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_name}", get(get_room_detail))
            .route("/api/messages/{room_name}", get(get_message_history))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the WebSocket chat relay server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "WebSocket chat relay listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws/chat/{{room_name}}?username={{name}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
