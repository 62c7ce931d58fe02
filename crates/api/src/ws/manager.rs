use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use medialab_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Authenticated user ID.
    pub user_id: Option<DbId>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
    /// Rooms this connection has joined.
    pub rooms: HashSet<String>,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<String, WsConnection>,
    /// room -> connection ids
    rooms: HashMap<String, HashSet<String>>,
}

impl Registry {
    fn detach_from_rooms(&mut self, conn_id: &str, rooms: &HashSet<String>) {
        for room in rooms {
            if let Some(members) = self.rooms.get_mut(room) {
                members.remove(conn_id);
                if members.is_empty() {
                    self.rooms.remove(room);
                }
            }
        }
    }
}

/// Manages all active WebSocket connections and their room memberships.
///
/// Thread-safe via an interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct WsManager {
    registry: RwLock<Registry>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
            rooms: HashSet::new(),
        };
        let mut registry = self.registry.write().await;
        if let Some(previous) = registry.connections.insert(conn_id.clone(), conn) {
            registry.detach_from_rooms(&conn_id, &previous.rooms);
        }
        rx
    }

    /// Remove a connection by its ID, dropping it from every room.
    pub async fn remove(&self, conn_id: &str) {
        let mut registry = self.registry.write().await;
        if let Some(conn) = registry.connections.remove(conn_id) {
            registry.detach_from_rooms(conn_id, &conn.rooms);
        }
    }

    /// Add a connection to `room`. Returns `false` for an unknown connection.
    pub async fn join(&self, conn_id: &str, room: &str) -> bool {
        let mut registry = self.registry.write().await;
        let Some(conn) = registry.connections.get_mut(conn_id) else {
            return false;
        };
        conn.rooms.insert(room.to_string());
        registry
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn_id.to_string());
        true
    }

    /// Remove a connection from `room`. Returns whether it was a member.
    pub async fn leave(&self, conn_id: &str, room: &str) -> bool {
        let mut registry = self.registry.write().await;
        let was_member = registry
            .connections
            .get_mut(conn_id)
            .is_some_and(|conn| conn.rooms.remove(room));
        if was_member {
            let single = HashSet::from([room.to_string()]);
            registry.detach_from_rooms(conn_id, &single);
        }
        was_member
    }

    /// Rooms joined by a connection, sorted.
    pub async fn rooms_of(&self, conn_id: &str) -> Vec<String> {
        let registry = self.registry.read().await;
        let mut rooms: Vec<String> = registry
            .connections
            .get(conn_id)
            .map(|c| c.rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// Connection ids currently in `room`, sorted.
    pub async fn room_members(&self, room: &str) -> Vec<String> {
        let registry = self.registry.read().await;
        let mut members: Vec<String> = registry
            .rooms
            .get(room)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Find all connection IDs associated with a given user.
    pub async fn get_by_user(&self, user_id: DbId) -> Vec<String> {
        self.registry
            .read()
            .await
            .connections
            .iter()
            .filter(|(_, conn)| conn.user_id == Some(user_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Send a message to one connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        let registry = self.registry.read().await;
        registry
            .connections
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Connections whose send channels are closed are skipped; they are
    /// cleaned up when their receive loop ends.
    pub async fn broadcast(&self, message: Message) {
        let registry = self.registry.read().await;
        for conn in registry.connections.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Send a message to every member of `room`.
    ///
    /// Returns the number of connections the message was queued for.
    pub async fn broadcast_to_room(&self, room: &str, message: Message) -> usize {
        let registry = self.registry.read().await;
        let Some(members) = registry.rooms.get(room) else {
            return 0;
        };
        members
            .iter()
            .filter_map(|id| registry.connections.get(id))
            .filter(|conn| conn.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Send a message to all connections belonging to a specific user.
    ///
    /// Returns the number of connections the message was sent to.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        let registry = self.registry.read().await;
        let mut count = 0;
        for conn in registry.connections.values() {
            if conn.user_id == Some(user_id) {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.connections.len()
    }

    /// Send a Close frame to every connection, then clear the registry.
    pub async fn shutdown_all(&self) {
        let mut registry = self.registry.write().await;
        let count = registry.connections.len();
        for conn in registry.connections.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        registry.connections.clear();
        registry.rooms.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let registry = self.registry.read().await;
        for conn in registry.connections.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
