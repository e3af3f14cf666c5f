use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Note, NoteVersion, VersionOrigin};

/// Number of snapshots ever handed to clients, newest first
pub const VERSION_PAGE_SIZE: usize = 20;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistent storage for notes and their version snapshots.
///
/// Implementations must make `update_note_content` atomic for a single note,
/// since the room engine and the REST fallback may write the same note concurrently.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create_note(&self, title: &str) -> Result<Note, StoreError>;

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>, StoreError>;

    /// Overwrite the content and bump `updated_at`. `None` when the note does not exist.
    async fn update_note_content(&self, id: Uuid, content: &str) -> Result<Option<Note>, StoreError>;

    async fn append_version(
        &self,
        note_id: Uuid,
        content: &str,
        origin: VersionOrigin,
    ) -> Result<NoteVersion, StoreError>;

    /// Most recent snapshots first, at most `limit` of them
    async fn list_versions(&self, note_id: Uuid, limit: usize) -> Result<Vec<NoteVersion>, StoreError>;

    async fn latest_versions(&self, note_id: Uuid) -> Result<Vec<NoteVersion>, StoreError> {
        self.list_versions(note_id, VERSION_PAGE_SIZE).await
    }
}
