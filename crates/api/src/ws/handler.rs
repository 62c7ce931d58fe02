use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use medialab_core::channels::{self, ROOM_GLOBAL};
use medialab_core::types::DbId;
use medialab_db::repositories::UserRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{authenticate, extract_token, AuthUser};
use crate::state::AppState;
use crate::ws::manager::WsManager;
use crate::ws::protocol::{parse_client_message, ClientMessage, ServerMessage};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The credential comes from `?token=` (browsers cannot set headers on the
/// upgrade request), then from the usual Bearer header or cookie. An invalid
/// credential is rejected with 401 before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let token = query
        .token
        .or_else(|| extract_token(&headers))
        .ok_or_else(|| AppError::unauthorized("Missing access token"))?;
    let user = authenticate(&token, &state).await?;
    let department_id = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .and_then(|u| u.department_id);

    Ok(ws.on_upgrade(move |socket| {
        handle_socket(socket, state.ws_manager, user, department_id)
    }))
}

/// Rooms a connection joins as soon as it is registered.
pub fn default_rooms(user: &AuthUser, department_id: Option<DbId>) -> Vec<String> {
    let mut rooms = vec![
        ROOM_GLOBAL.to_string(),
        channels::user_room(user.user_id),
        channels::role_room(&user.role),
    ];
    rooms.extend(department_id.map(channels::department_room));
    rooms
}

/// Check whether `user` may join `room`.
pub fn check_join(user: &AuthUser, room: &str) -> Result<(), String> {
    if !channels::is_valid_room(room) {
        return Err(format!("Invalid room: {room}"));
    }
    match channels::parse_user_room(room) {
        Some(owner) if owner != user.user_id && !user.is_admin() => {
            Err("Cannot join another user's room".to_string())
        }
        _ => Ok(()),
    }
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection and joins its default rooms.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Dispatches inbound envelopes on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(
    socket: WebSocket,
    ws_manager: Arc<WsManager>,
    user: AuthUser,
    department_id: Option<DbId>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = user.user_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), Some(user.user_id)).await;
    for room in default_rooms(&user, department_id) {
        ws_manager.join(&conn_id, &room).await;
    }

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    let welcome = ServerMessage::Welcome {
        connection_id: conn_id.clone(),
        user_id: user.user_id,
        rooms: ws_manager.rooms_of(&conn_id).await,
    };
    ws_manager.send_to(&conn_id, welcome.to_message()).await;

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply = dispatch(&ws_manager, &conn_id, &user, text.as_str()).await;
                ws_manager.send_to(&conn_id, reply.to_message()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Handle one client frame and produce the reply.
pub async fn dispatch(
    ws_manager: &WsManager,
    conn_id: &str,
    user: &AuthUser,
    text: &str,
) -> ServerMessage {
    let message = match parse_client_message(text) {
        Ok(message) => message,
        Err(e) => return ServerMessage::error(e),
    };

    match message {
        ClientMessage::Join { room } => {
            if let Err(e) = check_join(user, &room) {
                tracing::debug!(conn_id, room = %room, "Room join refused");
                return ServerMessage::error(e);
            }
            ws_manager.join(conn_id, &room).await;
            ServerMessage::Joined { room }
        }
        ClientMessage::Leave { room } => {
            if ws_manager.leave(conn_id, &room).await {
                ServerMessage::Left { room }
            } else {
                ServerMessage::error(format!("Not a member of {room}"))
            }
        }
        ClientMessage::Ping => ServerMessage::Pong,
    }
}
