//! WebSocket layer: connection registry with rooms, the `/ws` upgrade
//! handler, the JSON envelope, and the keep-alive heartbeat.

mod handler;
mod heartbeat;
pub mod manager;
pub mod protocol;

pub use handler::{check_join, default_rooms, dispatch, ws_handler};
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
