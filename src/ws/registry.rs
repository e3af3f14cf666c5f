use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, oneshot, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::room::{BackgroundError, JoinResult, Room, RoomCommand, RoomContext, RoomHandle, RoomStats};
use super::session::{ConnectionId, Outbound};
use crate::db::NoteStore;
use crate::models::RoomError;

const BACKGROUND_ERROR_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub autosave_interval: Duration,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_millis(5000),
        }
    }
}

/// Owns the live rooms, keyed by note ID.
///
/// A room exists only while it has at least one session. It is created by the
/// first successful join and tears itself down after its last session leaves.
pub struct RoomRegistry {
    ctx: Arc<RoomContext>,
    memberships: Mutex<HashMap<ConnectionId, Uuid>>,
    next_generation: AtomicU64,
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn NoteStore>, settings: RoomSettings) -> Self {
        let (background_errors, _) = broadcast::channel(BACKGROUND_ERROR_CAPACITY);
        Self {
            ctx: Arc::new(RoomContext {
                store,
                rooms: Arc::new(Mutex::new(HashMap::new())),
                autosave_interval: settings.autosave_interval,
                background_errors,
                autosave_failures: AtomicU64::new(0),
            }),
            memberships: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Join `connection_id` to the room of `note_id`, leaving any other room once
    /// the note is known to exist.
    ///
    /// On success the joiner has already been sent `note_loaded`, and the whole
    /// room a fresh `active_users`.
    pub async fn join(
        &self,
        note_id: Uuid,
        connection_id: &str,
        display_name: Option<String>,
        outbound: Outbound,
    ) -> Result<JoinResult, RoomError> {
        // Unknown notes never get a room, and a failed join keeps the current one
        match self.ctx.store.get_note(note_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(RoomError::note_not_found()),
            Err(e) => return Err(RoomError::persistence("load note", e)),
        }

        let previous = self.memberships.lock().await.get(connection_id).copied();
        if let Some(previous) = previous.filter(|prev| *prev != note_id) {
            debug!("{} switches from note {} to {}", connection_id, previous, note_id);
            self.leave(connection_id).await;
        }

        // Recorded before the room sees the join, so a leave racing it is queued behind it
        let rejoin = previous == Some(note_id);
        self.memberships.lock().await.insert(connection_id.to_string(), note_id);

        let result = loop {
            let (reply_tx, reply_rx) = oneshot::channel();
            let cmd = RoomCommand::Join {
                connection_id: connection_id.to_string(),
                display_name: display_name.clone(),
                outbound: outbound.clone(),
                reply: reply_tx,
            };
            {
                let mut rooms = self.ctx.rooms.lock().await;
                let handle = rooms.entry(note_id).or_insert_with(|| self.spawn_room(note_id));
                if handle.send(cmd).is_err() {
                    warn!("Room for note {} stopped unexpectedly, replacing it", note_id);
                    rooms.remove(&note_id);
                    continue;
                }
            }
            match reply_rx.await {
                Ok(result) => break result,
                Err(_) => debug!("Room for note {} closed while {} was joining, retrying", note_id, connection_id),
            }
        };

        if result.is_err() && !rejoin {
            let mut memberships = self.memberships.lock().await;
            if memberships.get(connection_id) == Some(&note_id) {
                memberships.remove(connection_id);
            }
        }
        result
    }

    /// Remove the connection from whatever room it is in. No-op when it is in none.
    pub async fn leave(&self, connection_id: &str) {
        let Some(note_id) = self.memberships.lock().await.remove(connection_id) else {
            return;
        };
        let Some(handle) = self.room(note_id).await else {
            return;
        };
        let (done_tx, done_rx) = oneshot::channel();
        let cmd = RoomCommand::Leave {
            connection_id: connection_id.to_string(),
            done: done_tx,
        };
        if handle.send(cmd).is_ok() {
            let _ = done_rx.await;
        }
        info!("{} left the room of note {}", connection_id, note_id);
    }

    /// Persist new content from a room member and fan it out
    pub async fn submit_update(&self, note_id: Uuid, connection_id: &str, content: String) -> Result<(), RoomError> {
        let handle = self.room(note_id).await.ok_or(RoomError::RoomNotFound(note_id))?;
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = RoomCommand::Update {
            connection_id: connection_id.to_string(),
            content,
            reply: reply_tx,
        };
        handle.send(cmd).map_err(|_| RoomError::RoomNotFound(note_id))?;
        reply_rx.await.unwrap_or(Err(RoomError::RoomNotFound(note_id)))
    }

    /// Relay a cursor to the other members. Silently dropped for non-members.
    pub async fn update_cursor(
        &self,
        note_id: Uuid,
        connection_id: &str,
        position: Option<Value>,
        selection: Option<Value>,
    ) {
        let Some(handle) = self.room(note_id).await else {
            debug!("Ignoring cursor for inactive note {}", note_id);
            return;
        };
        let _ = handle.send(RoomCommand::Cursor {
            connection_id: connection_id.to_string(),
            position,
            selection,
        });
    }

    pub async fn room_stats(&self, note_id: Uuid) -> Option<RoomStats> {
        let handle = self.room(note_id).await?;
        let (reply_tx, reply_rx) = oneshot::channel();
        handle.send(RoomCommand::Inspect { reply: reply_tx }).ok()?;
        reply_rx.await.ok()
    }

    pub async fn active_rooms(&self) -> Vec<Uuid> {
        self.ctx.rooms.lock().await.keys().copied().collect()
    }

    pub async fn room_count(&self) -> usize {
        self.ctx.rooms.lock().await.len()
    }

    pub async fn room_of(&self, connection_id: &str) -> Option<Uuid> {
        self.memberships.lock().await.get(connection_id).copied()
    }

    /// Failures from autosave ticks. Nothing waits on this channel.
    pub fn subscribe_background_errors(&self) -> broadcast::Receiver<BackgroundError> {
        self.ctx.background_errors.subscribe()
    }

    pub fn autosave_failures(&self) -> u64 {
        self.ctx.autosave_failures.load(Ordering::Relaxed)
    }

    async fn room(&self, note_id: Uuid) -> Option<RoomHandle> {
        self.ctx.rooms.lock().await.get(&note_id).cloned()
    }

    fn spawn_room(&self, note_id: Uuid) -> RoomHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        Room::spawn(note_id, generation, self.ctx.clone())
    }
}
