use std::sync::Arc;

use tracing::warn;

use super::registry::RoomRegistry;
use super::session::{ConnectionId, Outbound};
use crate::models::{RoomError, SendMessage};

/// What a message handler knows about the connection it serves
#[derive(Clone)]
pub struct ConnCtx {
    pub connection_id: ConnectionId,
    pub outbound: Outbound,
    pub registry: Arc<RoomRegistry>,
}

impl ConnCtx {
    pub fn reply(&self, msg: SendMessage) {
        if self.outbound.send(msg).is_err() {
            warn!("Connection {} is gone, reply dropped", self.connection_id);
        }
    }

    pub fn reply_error(&self, err: &RoomError) {
        self.reply(err.to_message());
    }
}
