//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! ルームのメンバー表とセッション → ルームの逆引き表を 1 つの Mutex で保護し、
//! 参加・離脱・配信を直列化します。
//!
//! 同じルームへの配信は Mutex の内側で順番に行われるため、
//! ルームの全メンバーが同じ順序でエンベロープを受け取ります。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    DeliveryReport, Envelope, MemberInfo, RegistryError, RoomId, RoomRegistry, RoomSnapshot,
    Session, SessionId,
};

#[derive(Default)]
struct RegistryState {
    /// ルーム名 → メンバー
    rooms: HashMap<RoomId, HashMap<SessionId, Arc<Session>>>,
    /// セッション → 所属ルーム
    memberships: HashMap<SessionId, RoomId>,
}

impl RegistryState {
    /// メンバー表と逆引き表の両方からセッションを取り除き、空のルームを削除する
    fn remove(&mut self, room_id: &RoomId, session_id: &SessionId) -> bool {
        let Some(members) = self.rooms.get_mut(room_id) else {
            return false;
        };
        let removed = members.remove(session_id).is_some();
        if members.is_empty() {
            self.rooms.remove(room_id);
            tracing::debug!("Room '{}' is empty and has been removed", room_id);
        }
        if removed && self.memberships.get(session_id) == Some(room_id) {
            self.memberships.remove(session_id);
        }
        removed
    }
}

fn member_infos(members: &HashMap<SessionId, Arc<Session>>) -> Vec<MemberInfo> {
    let mut infos: Vec<MemberInfo> = members
        .values()
        .map(|session| MemberInfo {
            session_id: session.id(),
            username: session.identity().clone(),
            connected_at: session.connected_at(),
        })
        .collect();
    infos.sort_by(|a, b| {
        a.connected_at
            .cmp(&b.connected_at)
            .then_with(|| a.username.cmp(&b.username))
    });
    infos
}

/// インメモリ Room Registry 実装
#[derive(Default)]
pub struct InMemoryRoomRegistry {
    state: Mutex<RegistryState>,
}

impl InMemoryRoomRegistry {
    /// 新しい InMemoryRoomRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn join(
        &self,
        room_id: &RoomId,
        session: Arc<Session>,
    ) -> Result<Option<RoomId>, RegistryError> {
        if session.is_closed() {
            return Err(RegistryError::SessionClosed(session.id().to_string()));
        }

        let mut state = self.state.lock().await;
        let session_id = session.id();

        let previous = match state.memberships.get(&session_id).cloned() {
            Some(current) if &current == room_id => None,
            Some(current) => {
                state.remove(&current, &session_id);
                tracing::debug!(
                    "Session '{}' left room '{}' to join '{}'",
                    session_id,
                    current,
                    room_id
                );
                Some(current)
            }
            None => None,
        };

        state
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(session_id, session);
        state.memberships.insert(session_id, room_id.clone());
        tracing::debug!("Session '{}' joined room '{}'", session_id, room_id);

        Ok(previous)
    }

    async fn leave(&self, room_id: &RoomId, session_id: &SessionId) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.remove(room_id, session_id);
        if removed {
            tracing::debug!("Session '{}' left room '{}'", session_id, room_id);
        }
        removed
    }

    async fn broadcast(
        &self,
        room_id: &RoomId,
        sender: &SessionId,
        envelope: Arc<Envelope>,
    ) -> Result<DeliveryReport, RegistryError> {
        let mut state = self.state.lock().await;
        let mut report = DeliveryReport::default();

        let members = match state.rooms.get(room_id) {
            Some(members) if members.contains_key(sender) => members,
            _ => {
                return Err(RegistryError::NotAMember {
                    session_id: sender.to_string(),
                    room_id: room_id.to_string(),
                });
            }
        };

        for (session_id, session) in members {
            // 一部の配信失敗は許容し、失敗したセッションは後で除外する
            match session.send(envelope.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to deliver to session '{}' in room '{}': {}",
                        session_id,
                        room_id,
                        e
                    );
                    report.failed.push(*session_id);
                }
            }
        }

        for session_id in &report.failed {
            state.remove(room_id, session_id);
        }

        Ok(report)
    }

    async fn room_of(&self, session_id: &SessionId) -> Option<RoomId> {
        let state = self.state.lock().await;
        state.memberships.get(session_id).cloned()
    }

    async fn members(&self, room_id: &RoomId) -> Vec<MemberInfo> {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .map(member_infos)
            .unwrap_or_default()
    }

    async fn rooms(&self) -> Vec<RoomSnapshot> {
        let state = self.state.lock().await;
        let mut snapshots: Vec<RoomSnapshot> = state
            .rooms
            .iter()
            .map(|(id, members)| RoomSnapshot {
                id: id.clone(),
                members: member_infos(members),
            })
            .collect();
        snapshots.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        EnvelopeDraft, OutboundReceiver, SessionIdFactory, Timestamp, Username,
    };

    fn room(name: &str) -> RoomId {
        RoomId::new(name.to_string()).unwrap()
    }

    fn session(name: &str, connected_at: i64, capacity: usize) -> (Arc<Session>, OutboundReceiver) {
        let (session, receiver) = Session::new(
            SessionIdFactory::generate(),
            Username::new(name.to_string()).unwrap(),
            Timestamp::new(connected_at),
            capacity,
        );
        (Arc::new(session), receiver)
    }

    fn envelope(room_id: &RoomId, text: &str) -> Arc<Envelope> {
        let alice = Username::new("alice".to_string()).unwrap();
        Arc::new(
            Envelope::validate(
                EnvelopeDraft::chat(text, "alice", "bob"),
                room_id.clone(),
                &alice,
                Timestamp::new(0),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_join_adds_member() {
        // テスト項目: 参加したセッションがルームのメンバーになる
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (alice, _rx) = session("alice", 1, 8);

        // when (操作):
        let previous = registry.join(&room("lobby"), alice.clone()).await.unwrap();

        // then (期待する結果):
        assert_eq!(previous, None);
        let members = registry.members(&room("lobby")).await;
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].username.as_str(), "alice");
        assert_eq!(registry.room_of(&alice.id()).await, Some(room("lobby")));
    }

    #[tokio::test]
    async fn test_join_twice_is_idempotent() {
        // テスト項目: 同じルームへの再参加はメンバーを重複させない
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (alice, _rx) = session("alice", 1, 8);
        registry.join(&room("lobby"), alice.clone()).await.unwrap();

        // when (操作):
        let previous = registry.join(&room("lobby"), alice.clone()).await.unwrap();

        // then (期待する結果):
        assert_eq!(previous, None);
        assert_eq!(registry.members(&room("lobby")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_join_other_room_leaves_previous() {
        // テスト項目: 別のルームに参加すると元のルームから離脱する
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (alice, _rx) = session("alice", 1, 8);
        registry.join(&room("first"), alice.clone()).await.unwrap();

        // when (操作):
        let previous = registry.join(&room("second"), alice.clone()).await.unwrap();

        // then (期待する結果):
        assert_eq!(previous, Some(room("first")));
        assert!(registry.members(&room("first")).await.is_empty());
        assert_eq!(registry.members(&room("second")).await.len(), 1);
        assert_eq!(registry.rooms().await.len(), 1);
    }

    #[tokio::test]
    async fn test_join_closed_session_fails() {
        // テスト項目: 閉じたセッションは参加できない
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (alice, _rx) = session("alice", 1, 8);
        alice.close();

        // when (操作):
        let result = registry.join(&room("lobby"), alice.clone()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RegistryError::SessionClosed(_))));
        assert!(registry.rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_leave_is_idempotent_and_reaps_empty_room() {
        // テスト項目: 離脱は冪等で、空になったルームは削除される
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (alice, _rx) = session("alice", 1, 8);
        registry.join(&room("lobby"), alice.clone()).await.unwrap();

        // when (操作):
        let first = registry.leave(&room("lobby"), &alice.id()).await;
        let second = registry.leave(&room("lobby"), &alice.id()).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(registry.rooms().await.is_empty());
        assert_eq!(registry.room_of(&alice.id()).await, None);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_member_including_sender() {
        // テスト項目: 配信は送信者自身を含む全メンバーに届く
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (alice, mut alice_rx) = session("alice", 1, 8);
        let (bob, mut bob_rx) = session("bob", 2, 8);
        let (carol, mut carol_rx) = session("carol", 3, 8);
        let alice_id = alice.id();
        registry.join(&room("alice_bob"), alice).await.unwrap();
        registry.join(&room("alice_bob"), bob).await.unwrap();
        registry.join(&room("elsewhere"), carol).await.unwrap();

        // when (操作):
        let report = registry
            .broadcast(&room("alice_bob"), &alice_id, envelope(&room("alice_bob"), "hi"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        assert!(report.failed.is_empty());
        assert_eq!(alice_rx.recv().await.unwrap().text().unwrap().as_str(), "hi");
        assert_eq!(bob_rx.recv().await.unwrap().text().unwrap().as_str(), "hi");
        assert!(carol_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_room_fails() {
        // テスト項目: 存在しないルームへの配信は NotAMember エラーになる
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let sender = SessionIdFactory::generate();

        // when (操作):
        let result = registry
            .broadcast(&room("ghost"), &sender, envelope(&room("ghost"), "hi"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RegistryError::NotAMember { .. })));
        assert!(registry.rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_from_member_of_other_room_fails() {
        // テスト項目: 別のルームのメンバーからの配信は誰にも届かない
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (alice, mut alice_rx) = session("alice", 1, 8);
        let (carol, _carol_rx) = session("carol", 2, 8);
        registry.join(&room("alice_bob"), alice).await.unwrap();
        registry.join(&room("elsewhere"), carol.clone()).await.unwrap();

        // when (操作):
        let result = registry
            .broadcast(&room("alice_bob"), &carol.id(), envelope(&room("alice_bob"), "hi"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RegistryError::NotAMember {
                session_id: carol.id().to_string(),
                room_id: "alice_bob".to_string(),
            })
        );
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_evicts_full_session() {
        // テスト項目: キューがあふれたセッションは除外され、他のメンバーには配信される
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (slow, _slow_rx) = session("slow", 1, 1);
        let (fast, mut fast_rx) = session("fast", 2, 8);
        registry.join(&room("lobby"), slow.clone()).await.unwrap();
        registry.join(&room("lobby"), fast.clone()).await.unwrap();
        registry
            .broadcast(&room("lobby"), &fast.id(), envelope(&room("lobby"), "one"))
            .await
            .unwrap();

        // when (操作):
        let report = registry
            .broadcast(&room("lobby"), &fast.id(), envelope(&room("lobby"), "two"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec![slow.id()]);
        assert!(slow.is_closed());
        let members = registry.members(&room("lobby")).await;
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].username.as_str(), "fast");
        assert_eq!(registry.room_of(&slow.id()).await, None);
        assert_eq!(fast_rx.recv().await.unwrap().text().unwrap().as_str(), "one");
        assert_eq!(fast_rx.recv().await.unwrap().text().unwrap().as_str(), "two");
    }

    #[tokio::test]
    async fn test_rooms_are_sorted_with_members_by_connection_time() {
        // テスト項目: ルーム一覧は名前順、メンバーは接続時刻順
        // given (前提条件):
        let registry = InMemoryRoomRegistry::new();
        let (bob, _bob_rx) = session("bob", 20, 8);
        let (alice, _alice_rx) = session("alice", 10, 8);
        let (carol, _carol_rx) = session("carol", 30, 8);
        registry.join(&room("zeta"), carol).await.unwrap();
        registry.join(&room("alpha"), bob).await.unwrap();
        registry.join(&room("alpha"), alice).await.unwrap();

        // when (操作):
        let rooms = registry.rooms().await;

        // then (期待する結果):
        let names: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        let members: Vec<&str> = rooms[0]
            .members
            .iter()
            .map(|m| m.username.as_str())
            .collect();
        assert_eq!(members, vec!["alice", "bob"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_join_leave_broadcast_keeps_membership_consistent() {
        // テスト項目: 多数のタスクが同時に参加・離脱・配信しても、所属の重複や取り残しが発生しない
        // given (前提条件):
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let rooms = [room("red"), room("green"), room("blue")];
        let mut handles = Vec::new();

        // when (操作):
        for i in 0..16usize {
            let registry = registry.clone();
            let rooms = rooms.clone();
            handles.push(tokio::spawn(async move {
                let (member, rx) = session(&format!("user{}", i), i as i64, 4096);
                for round in 0..50usize {
                    let target = &rooms[(i + round) % rooms.len()];
                    registry.join(target, member.clone()).await.unwrap();
                    registry
                        .broadcast(target, &member.id(), envelope(target, "ping"))
                        .await
                        .unwrap();
                    if round % 7 == 0 {
                        registry.leave(target, &member.id()).await;
                    }
                    tokio::task::yield_now().await;
                }
                // 偶数番は離脱して終わり、奇数番は最後のルームに残る
                let last = &rooms[(i + 49) % rooms.len()];
                if i % 2 == 0 {
                    registry.leave(last, &member.id()).await;
                } else {
                    registry.join(last, member.clone()).await.unwrap();
                }
                (i, member.id(), last.clone(), rx)
            }));
        }
        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap());
        }

        // then (期待する結果):
        let snapshots = registry.rooms().await;
        let listed: Vec<SessionId> = snapshots
            .iter()
            .flat_map(|snapshot| snapshot.members.iter().map(|m| m.session_id))
            .collect();
        let unique: std::collections::HashSet<SessionId> = listed.iter().copied().collect();
        assert_eq!(listed.len(), unique.len(), "a session is listed twice");
        assert!(snapshots.iter().all(|snapshot| !snapshot.members.is_empty()));
        assert_eq!(listed.len(), 8);

        for (i, session_id, last, _rx) in &finished {
            let current = registry.room_of(session_id).await;
            if i % 2 == 0 {
                assert_eq!(current, None);
                assert!(!unique.contains(session_id));
            } else {
                assert_eq!(current.as_ref(), Some(last));
                let members = registry.members(last).await;
                assert_eq!(
                    members.iter().filter(|m| m.session_id == *session_id).count(),
                    1
                );
            }
        }
    }
}
