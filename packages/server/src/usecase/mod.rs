//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod error;
pub mod get_message_history;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
pub mod persist_message;
pub mod relay_message;

pub use error::{GetHistoryError, GetRoomDetailError, JoinError, PersistError, RelayError};
pub use get_message_history::GetMessageHistoryUseCase;
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use persist_message::PersistMessageUseCase;
pub use relay_message::RelayMessageUseCase;
