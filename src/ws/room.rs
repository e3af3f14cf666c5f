use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::{broadcast, oneshot, Mutex};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::autosave::AutosaveTimer;
use super::session::{ConnectionId, CursorState, Outbound, Session};
use crate::db::NoteStore;
use crate::models::{
    ActiveUser, ActiveUsersMessage, AutosaveMessage, CursorBroadcastMessage, CursorLeaveMessage, Note,
    NoteLoadedMessage, NoteUpdateBroadcastMessage, NoteVersion, RoomError, SendMessage, VersionOrigin,
    VersionsUpdatedMessage,
};

/// Events processed one at a time by a room
pub(crate) enum RoomCommand {
    Join {
        connection_id: ConnectionId,
        display_name: Option<String>,
        outbound: Outbound,
        reply: oneshot::Sender<Result<JoinResult, RoomError>>,
    },
    Leave {
        connection_id: ConnectionId,
        done: oneshot::Sender<()>,
    },
    Update {
        connection_id: ConnectionId,
        content: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Cursor {
        connection_id: ConnectionId,
        position: Option<Value>,
        selection: Option<Value>,
    },
    AutosaveTick,
    Inspect {
        reply: oneshot::Sender<RoomStats>,
    },
}

/// State a freshly joined client renders immediately
#[derive(Debug, Clone, PartialEq)]
pub struct JoinResult {
    pub note: Note,
    pub versions: Vec<NoteVersion>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomStats {
    pub sessions: usize,
    pub autosave_running: bool,
}

/// A failure nobody asked for, such as an autosave tick that could not persist
#[derive(Debug, Clone)]
pub struct BackgroundError {
    pub note_id: Uuid,
    pub message: String,
}

pub(crate) type RoomMap = Arc<Mutex<HashMap<Uuid, RoomHandle>>>;

#[derive(Clone)]
pub(crate) struct RoomHandle {
    generation: u64,
    commands: UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    pub(crate) fn send(&self, cmd: RoomCommand) -> Result<(), RoomCommand> {
        self.commands.send(cmd).map_err(|e| e.0)
    }
}

/// Everything the rooms of one registry share
pub(crate) struct RoomContext {
    pub(crate) store: Arc<dyn NoteStore>,
    pub(crate) rooms: RoomMap,
    pub(crate) autosave_interval: Duration,
    pub(crate) background_errors: broadcast::Sender<BackgroundError>,
    pub(crate) autosave_failures: AtomicU64,
}

/// Single owner of one note's live state.
///
/// Runs as its own task and handles commands strictly in arrival order. It
/// removes itself from the room map as soon as its last session is gone.
pub(crate) struct Room {
    note_id: Uuid,
    generation: u64,
    ctx: Arc<RoomContext>,
    sessions: HashMap<ConnectionId, Session>,
    autosave: Option<AutosaveTimer>,
    commands: WeakUnboundedSender<RoomCommand>,
}

impl Room {
    pub(crate) fn spawn(note_id: Uuid, generation: u64, ctx: Arc<RoomContext>) -> RoomHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let room = Room {
            note_id,
            generation,
            ctx,
            sessions: HashMap::new(),
            autosave: None,
            commands: tx.downgrade(),
        };
        tokio::spawn(room.run(rx));
        info!("Room for note {} created", note_id);
        RoomHandle { generation, commands: tx }
    }

    async fn run(mut self, mut rx: UnboundedReceiver<RoomCommand>) {
        while let Some(cmd) = rx.recv().await {
            self.handle(cmd).await;
            if self.sessions.is_empty() {
                break;
            }
        }
        self.close(rx).await;
    }

    async fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { connection_id, display_name, outbound, reply } => {
                let result = self.join(connection_id, display_name, outbound).await;
                let _ = reply.send(result);
            }
            RoomCommand::Leave { connection_id, done } => {
                self.leave(&connection_id);
                let _ = done.send(());
            }
            RoomCommand::Update { connection_id, content, reply } => {
                let result = self.update(&connection_id, content).await;
                let _ = reply.send(result);
            }
            RoomCommand::Cursor { connection_id, position, selection } => {
                self.update_cursor(&connection_id, position, selection);
            }
            RoomCommand::AutosaveTick => self.autosave_tick().await,
            RoomCommand::Inspect { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    async fn close(mut self, mut rx: UnboundedReceiver<RoomCommand>) {
        // Dropping the timer aborts it
        self.autosave = None;
        {
            let mut rooms = self.ctx.rooms.lock().await;
            if rooms.get(&self.note_id).is_some_and(|h| h.generation == self.generation) {
                rooms.remove(&self.note_id);
            }
        }

        // Commands that raced the shutdown get their reply channel dropped,
        // which callers read as "room gone"
        rx.close();
        while let Some(_cmd) = rx.recv().await {
            debug!("Discarding command for closed room of note {}", self.note_id);
        }
        info!("Room for note {} destroyed", self.note_id);
    }

    async fn join(
        &mut self,
        connection_id: ConnectionId,
        display_name: Option<String>,
        outbound: Outbound,
    ) -> Result<JoinResult, RoomError> {
        let store = self.ctx.store.clone();
        let note = store
            .get_note(self.note_id)
            .await
            .map_err(|e| RoomError::persistence("load note", e))?
            .ok_or_else(RoomError::note_not_found)?;
        let versions = store
            .latest_versions(self.note_id)
            .await
            .map_err(|e| RoomError::persistence("load note", e))?;

        let session = Session::new(connection_id.clone(), display_name, outbound);
        session.send(SendMessage::NoteLoaded(NoteLoadedMessage {
            document_id: self.note_id,
            content: note.content.clone(),
            updated_at: note.updated_at,
            versions: versions.clone(),
        }));
        info!("{} ({}) joined note {}", session.display_name, connection_id, self.note_id);
        self.sessions.insert(connection_id, session);

        self.broadcast_presence();

        if self.autosave.is_none() {
            self.autosave = Some(AutosaveTimer::start(
                self.note_id,
                self.ctx.autosave_interval,
                self.commands.clone(),
            ));
        }

        Ok(JoinResult { note, versions })
    }

    fn leave(&mut self, connection_id: &str) {
        let Some(session) = self.sessions.remove(connection_id) else {
            return;
        };
        info!("{} ({}) left note {}", session.display_name, connection_id, self.note_id);

        self.broadcast(
            SendMessage::CursorLeave(CursorLeaveMessage { connection_id: connection_id.to_string() }),
            None,
        );
        if self.sessions.is_empty() {
            self.autosave = None;
        } else {
            self.broadcast_presence();
        }
    }

    /// Last write wins: persist, snapshot, then fan out
    async fn update(&mut self, connection_id: &str, content: String) -> Result<(), RoomError> {
        if !self.sessions.contains_key(connection_id) {
            return Err(RoomError::RoomNotFound(self.note_id));
        }
        let store = self.ctx.store.clone();

        let note = store
            .update_note_content(self.note_id, &content)
            .await
            .map_err(|e| {
                error!("Failed to persist update for note {} from {}: {}", self.note_id, connection_id, e);
                RoomError::persistence("update note", e)
            })?
            .ok_or_else(RoomError::note_not_found)?;

        let mut failure = None;
        if let Err(e) = store
            .append_version(self.note_id, &note.content, VersionOrigin::SocketUpdate)
            .await
        {
            error!("Failed to snapshot note {}: {}", self.note_id, e);
            failure = Some(RoomError::persistence("save note version", e));
        }

        self.broadcast(
            SendMessage::NoteUpdateBroadcast(NoteUpdateBroadcastMessage {
                document_id: self.note_id,
                content: note.content,
                updated_at: note.updated_at,
            }),
            Some(connection_id),
        );

        match store.latest_versions(self.note_id).await {
            Ok(versions) => self.broadcast(SendMessage::VersionsUpdated(VersionsUpdatedMessage { versions }), None),
            Err(e) => {
                error!("Failed to list versions of note {}: {}", self.note_id, e);
                if failure.is_none() {
                    failure = Some(RoomError::persistence("load note versions", e));
                }
            }
        }

        failure.map_or(Ok(()), Err)
    }

    fn update_cursor(&mut self, connection_id: &str, position: Option<Value>, selection: Option<Value>) {
        let Some(session) = self.sessions.get_mut(connection_id) else {
            debug!("Ignoring cursor from {} outside note {}", connection_id, self.note_id);
            return;
        };
        session.cursor = Some(CursorState {
            position: position.clone(),
            selection: selection.clone(),
            updated_at: Utc::now(),
        });
        let msg = SendMessage::CursorUpdate(CursorBroadcastMessage {
            connection_id: connection_id.to_string(),
            cursor_position: position,
            selection,
            display_name: session.display_name.clone(),
        });
        self.broadcast(msg, Some(connection_id));
    }

    async fn autosave_tick(&mut self) {
        if let Some(timer) = &self.autosave {
            timer.tick_received();
        }
        if self.sessions.is_empty() {
            self.autosave = None;
            return;
        }

        if let Err(e) = self.autosave_once().await {
            let failures = self.ctx.autosave_failures.fetch_add(1, Ordering::Relaxed) + 1;
            let message = match &e {
                RoomError::Persistence { source, .. } => format!("{}: {}", e, source),
                other => other.to_string(),
            };
            error!("Autosave error for note {}: {} ({} failures total)", self.note_id, message, failures);
            let _ = self.ctx.background_errors.send(BackgroundError {
                note_id: self.note_id,
                message,
            });
        }
    }

    async fn autosave_once(&self) -> Result<(), RoomError> {
        let store = self.ctx.store.clone();
        let note = store
            .get_note(self.note_id)
            .await
            .map_err(|e| RoomError::persistence("load note", e))?
            .ok_or_else(RoomError::note_not_found)?;
        store
            .append_version(self.note_id, &note.content, VersionOrigin::Autosave)
            .await
            .map_err(|e| RoomError::persistence("autosave note", e))?;
        let versions = store
            .latest_versions(self.note_id)
            .await
            .map_err(|e| RoomError::persistence("load note versions", e))?;

        self.broadcast(
            SendMessage::Autosave(AutosaveMessage {
                document_id: self.note_id,
                updated_at: note.updated_at,
            }),
            None,
        );
        self.broadcast(SendMessage::VersionsUpdated(VersionsUpdatedMessage { versions }), None);
        debug!("Auto-saved version for note {}", self.note_id);
        Ok(())
    }

    /// Full member list, sent as a replacement rather than a delta
    fn broadcast_presence(&self) {
        let mut users: Vec<ActiveUser> = self.sessions.values().map(Session::presence).collect();
        users.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });
        self.broadcast(
            SendMessage::ActiveUsers(ActiveUsersMessage {
                document_id: self.note_id,
                users,
            }),
            None,
        );
    }

    fn broadcast(&self, msg: SendMessage, except: Option<&str>) {
        for session in self.sessions.values() {
            if except == Some(session.connection_id.as_str()) {
                continue;
            }
            if !session.send(msg.clone()) {
                debug!("Dropped message for closed connection {}", session.connection_id);
            }
        }
    }

    fn stats(&self) -> RoomStats {
        RoomStats {
            sessions: self.sessions.len(),
            autosave_running: self.autosave.as_ref().is_some_and(AutosaveTimer::is_running),
        }
    }
}
