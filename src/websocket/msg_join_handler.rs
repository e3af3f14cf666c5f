use tracing::{info, warn};

use crate::models::{parse_note_id, JoinNoteMessage, RoomError};
use crate::ws::ConnCtx;

/// Handle JoinNoteMessage
pub async fn handle_join_message(join_msg: &JoinNoteMessage, ctx: &ConnCtx) {
    let Some(raw_id) = join_msg.document_id.as_deref().filter(|id| !id.trim().is_empty()) else {
        ctx.reply_error(&RoomError::Validation("documentId required".to_string()));
        return;
    };
    let note_id = match parse_note_id(raw_id) {
        Ok(id) => id,
        Err(e) => {
            warn!("Invalid note ID '{}' from {}: {}", raw_id, ctx.connection_id, e);
            ctx.reply_error(&RoomError::Validation("Invalid note ID".to_string()));
            return;
        }
    };

    match ctx
        .registry
        .join(note_id, &ctx.connection_id, join_msg.display_name.clone(), ctx.outbound.clone())
        .await
    {
        Ok(result) => info!(
            "{} joined note {} ({} versions)",
            ctx.connection_id,
            note_id,
            result.versions.len()
        ),
        Err(e) => {
            warn!("Join of note {} by {} failed: {}", note_id, ctx.connection_id, e);
            ctx.reply_error(&e);
        }
    }
}
