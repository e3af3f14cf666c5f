use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;
use uuid::Uuid;

use super::room::RoomCommand;

/// Periodic autosave for one room.
///
/// The timer never touches room state itself: every tick is queued into the
/// room's command channel and handled in order with edits and presence changes.
/// At most one tick is queued at a time.
pub(crate) struct AutosaveTimer {
    task: JoinHandle<()>,
    pending: Arc<AtomicBool>,
}

impl AutosaveTimer {
    pub(crate) fn start(note_id: Uuid, period: Duration, commands: WeakUnboundedSender<RoomCommand>) -> Self {
        let pending = Arc::new(AtomicBool::new(false));
        let flag = pending.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(tx) = commands.upgrade() else {
                    break;
                };
                if flag.swap(true, Ordering::AcqRel) {
                    // Previous tick still queued
                    continue;
                }
                if tx.send(RoomCommand::AutosaveTick).is_err() {
                    break;
                }
            }
            debug!("Autosave timer for note {} stopped", note_id);
        });
        debug!("Autosave timer for note {} started ({:?})", note_id, period);
        Self { task, pending }
    }

    /// Called by the room when it starts handling a tick
    pub(crate) fn tick_received(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AutosaveTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
