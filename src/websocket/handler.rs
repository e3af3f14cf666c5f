use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{ReceivedMessage, SendMessage};
use crate::websocket::msg_cursor_handler::handle_cursor_message;
use crate::websocket::msg_join_handler::handle_join_message;
use crate::websocket::msg_ping_handler::handle_ping_message;
use crate::websocket::msg_update_handler::handle_update_message;
use crate::ws::{ConnCtx, RoomRegistry};
use crate::AppState;

/// WebSocket handler
pub async fn websocket_handler(
    headers: HeaderMap,
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    if let Some(origin) = origin {
        if !app_state.config.is_origin_allowed(origin) {
            warn!("Rejected WebSocket connection from origin {}", origin);
            return (StatusCode::FORBIDDEN, "Origin not allowed").into_response();
        }
    }

    info!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

// Make sure a connection leaves its room however the socket ends
struct DeferLeave {
    registry: Arc<RoomRegistry>,
    connection_id: String,
}

impl Drop for DeferLeave {
    fn drop(&mut self) {
        let registry = self.registry.clone();
        let connection_id = std::mem::take(&mut self.connection_id);
        tokio::spawn(async move {
            registry.leave(&connection_id).await;
            info!("Socket disconnected: {}", connection_id);
        });
    }
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    // Generate unique connection ID to identify this client
    let connection_id = Uuid::new_v4().to_string();
    info!("WebSocket connection established with connection_id: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<SendMessage>();

    let _defer_leave = DeferLeave {
        registry: app_state.registry.clone(),
        connection_id: connection_id.clone(),
    };

    // Everything the rooms send to this connection goes through one writer
    let writer_id = connection_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize message for {}: {}", writer_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let ctx = ConnCtx {
        connection_id,
        outbound,
        registry: app_state.registry.clone(),
    };

    // Messages of one connection are handled one after another
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => dispatch_message(&ctx, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("Socket error on {}: {}", ctx.connection_id, e);
                break;
            }
        }
    }

    send_task.abort();
    info!("WebSocket connection terminated: {}", ctx.connection_id);
}

async fn dispatch_message(ctx: &ConnCtx, text: &str) {
    let msg: ReceivedMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to parse message from {}: {}", ctx.connection_id, e);
            ctx.reply(SendMessage::error(format!("Invalid message: {}", e)));
            return;
        }
    };
    debug!("Received message from {}: {:?}", ctx.connection_id, msg);

    match msg {
        ReceivedMessage::JoinNote(join_msg) => handle_join_message(&join_msg, ctx).await,
        ReceivedMessage::NoteUpdate(update_msg) => handle_update_message(update_msg, ctx).await,
        ReceivedMessage::CursorUpdate(cursor_msg) => handle_cursor_message(cursor_msg, ctx).await,
        ReceivedMessage::Ping => handle_ping_message(ctx),
    }
}
