use chrono::Utc;
use tracing::debug;

use crate::models::{PongMessage, SendMessage};
use crate::ws::ConnCtx;

/// Handle PingMessage
pub fn handle_ping_message(ctx: &ConnCtx) {
    debug!("Ping received from {}", ctx.connection_id);
    ctx.reply(SendMessage::Pong(PongMessage { date: Utc::now().to_rfc3339() }));
}
