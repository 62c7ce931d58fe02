//! Room bookkeeping and delivery semantics of the WebSocket manager.

use assert_matches::assert_matches;
use axum::extract::ws::Message;
use medialab_api::ws::protocol::ServerMessage;
use medialab_api::ws::WsManager;

fn text(msg: &str) -> Message {
    Message::Text(msg.to_string().into())
}

#[tokio::test]
async fn join_and_leave_track_membership() {
    let manager = WsManager::new();
    let _rx = manager.add("a".into(), Some(1)).await;

    assert!(manager.join("a", "global").await);
    assert!(manager.join("a", "user:1").await);
    assert_eq!(manager.rooms_of("a").await, vec!["global", "user:1"]);
    assert_eq!(manager.room_members("global").await, vec!["a"]);

    assert!(manager.leave("a", "global").await);
    assert!(!manager.leave("a", "global").await);
    assert!(manager.room_members("global").await.is_empty());

    // Unknown connections cannot join.
    assert!(!manager.join("ghost", "global").await);
}

#[tokio::test]
async fn room_broadcast_reaches_members_only() {
    let manager = WsManager::new();
    let mut a = manager.add("a".into(), Some(1)).await;
    let mut b = manager.add("b".into(), Some(2)).await;
    manager.join("a", "role:admin").await;

    let sent = manager.broadcast_to_room("role:admin", text("hello")).await;
    assert_eq!(sent, 1);
    assert_eq!(a.try_recv().unwrap(), text("hello"));
    assert!(b.try_recv().is_err());

    assert_eq!(manager.broadcast_to_room("nobody-here", text("x")).await, 0);
}

#[tokio::test]
async fn send_to_user_reaches_every_tab() {
    let manager = WsManager::new();
    let mut tab1 = manager.add("t1".into(), Some(7)).await;
    let mut tab2 = manager.add("t2".into(), Some(7)).await;
    let mut other = manager.add("t3".into(), Some(8)).await;

    let msg = ServerMessage::Pong.to_message();
    assert_eq!(manager.send_to_user(7, msg.clone()).await, 2);
    assert_eq!(tab1.try_recv().unwrap(), msg);
    assert_eq!(tab2.try_recv().unwrap(), msg);
    assert!(other.try_recv().is_err());

    let mut ids = manager.get_by_user(7).await;
    ids.sort();
    assert_eq!(ids, vec!["t1", "t2"]);
}

#[tokio::test]
async fn remove_drops_room_membership() {
    let manager = WsManager::new();
    let _rx = manager.add("a".into(), Some(1)).await;
    manager.join("a", "global").await;

    manager.remove("a").await;
    assert_eq!(manager.connection_count().await, 0);
    assert!(manager.room_members("global").await.is_empty());
    assert!(!manager.send_to("a", text("late")).await);
}

#[tokio::test]
async fn re_adding_a_connection_resets_its_rooms() {
    let manager = WsManager::new();
    let _old = manager.add("a".into(), Some(1)).await;
    manager.join("a", "global").await;

    let _new = manager.add("a".into(), Some(1)).await;
    assert!(manager.rooms_of("a").await.is_empty());
    assert!(manager.room_members("global").await.is_empty());
    assert_eq!(manager.connection_count().await, 1);
}

#[tokio::test]
async fn shutdown_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("a".into(), None).await;
    manager.join("a", "global").await;

    manager.shutdown_all().await;
    assert_matches!(rx.try_recv(), Ok(Message::Close(None)));
    assert_eq!(manager.connection_count().await, 0);
    assert!(manager.room_members("global").await.is_empty());
}

#[tokio::test]
async fn ping_all_sends_ping_frames() {
    let manager = WsManager::new();
    let mut rx = manager.add("a".into(), Some(1)).await;
    manager.ping_all().await;
    assert_matches!(rx.try_recv(), Ok(Message::Ping(_)));
}
