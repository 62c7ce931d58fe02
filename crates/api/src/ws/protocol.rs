//! JSON message envelope exchanged over the WebSocket.
//!
//! Every frame is a text frame holding `{"type": <string>, "data": <json>}`.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    Join { room: String },
    Leave { room: String },
    Ping,
}

/// Messages the server sends.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        connection_id: String,
        user_id: medialab_core::types::DbId,
        rooms: Vec<String>,
    },
    Joined { room: String },
    Left { room: String },
    Pong,
    Notification(serde_json::Value),
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Serialize into a text frame.
    pub fn to_message(&self) -> Message {
        // Serializing these variants cannot fail: all keys are strings.
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        Message::Text(json.into())
    }
}

/// Parse a client text frame.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, String> {
    serde_json::from_str(text).map_err(|e| format!("Invalid message: {e}"))
}
