use tracing::{info, warn};

use crate::models::{parse_note_id, NoteUpdateMessage, RoomError};
use crate::ws::ConnCtx;

/// Handle NoteUpdateMessage
pub async fn handle_update_message(update_msg: NoteUpdateMessage, ctx: &ConnCtx) {
    let (Some(raw_id), Some(content)) = (update_msg.document_id, update_msg.content) else {
        ctx.reply_error(&RoomError::Validation("documentId and content required".to_string()));
        return;
    };
    let Ok(note_id) = parse_note_id(&raw_id) else {
        ctx.reply_error(&RoomError::Validation("Invalid note ID".to_string()));
        return;
    };

    info!("Update for note {} from {} ({} bytes)", note_id, ctx.connection_id, content.len());
    if let Err(e) = ctx.registry.submit_update(note_id, &ctx.connection_id, content).await {
        warn!("Update of note {} by {} failed: {}", note_id, ctx.connection_id, e);
        ctx.reply_error(&e);
    }
}
