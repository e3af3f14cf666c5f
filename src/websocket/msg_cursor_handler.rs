use crate::models::{parse_note_id, CursorUpdateMessage};
use crate::ws::ConnCtx;

/// Handle CursorUpdateMessage. Bad input is dropped without a reply.
pub async fn handle_cursor_message(cursor_msg: CursorUpdateMessage, ctx: &ConnCtx) {
    let Some(note_id) = cursor_msg.document_id.as_deref().and_then(|raw| parse_note_id(raw).ok()) else {
        return;
    };
    ctx.registry
        .update_cursor(note_id, &ctx.connection_id, cursor_msg.cursor_position, cursor_msg.selection)
        .await;
}
