use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::store::{NoteStore, StoreError};
use crate::models::{Note, NoteVersion, VersionOrigin};

#[derive(Default)]
struct MemoryState {
    notes: HashMap<Uuid, Note>,
    // Insertion order is creation order
    versions: HashMap<Uuid, Vec<NoteVersion>>,
}

/// In-process store, used when no database is configured and in tests
#[derive(Default)]
pub struct MemoryNoteStore {
    state: RwLock<MemoryState>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn create_note(&self, title: &str) -> Result<Note, StoreError> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: String::new(),
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.notes.insert(note.id, note.clone());
        debug!("Created note {} in memory", note.id);
        Ok(note)
    }

    async fn get_note(&self, id: Uuid) -> Result<Option<Note>, StoreError> {
        Ok(self.state.read().await.notes.get(&id).cloned())
    }

    async fn update_note_content(&self, id: Uuid, content: &str) -> Result<Option<Note>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.notes.get_mut(&id).map(|note| {
            note.content = content.to_string();
            note.updated_at = Utc::now();
            note.clone()
        }))
    }

    async fn append_version(
        &self,
        note_id: Uuid,
        content: &str,
        origin: VersionOrigin,
    ) -> Result<NoteVersion, StoreError> {
        let version = NoteVersion {
            id: Uuid::new_v4(),
            note_id,
            content: content.to_string(),
            origin,
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .versions
            .entry(note_id)
            .or_default()
            .push(version.clone());
        Ok(version)
    }

    async fn list_versions(&self, note_id: Uuid, limit: usize) -> Result<Vec<NoteVersion>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .versions
            .get(&note_id)
            .map(|versions| versions.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::VERSION_PAGE_SIZE;

    #[tokio::test]
    async fn latest_versions_are_capped_and_newest_first() {
        let store = MemoryNoteStore::new();
        let note = store.create_note("capped").await.unwrap();
        for i in 0..25 {
            store
                .append_version(note.id, &format!("v{}", i), VersionOrigin::SocketUpdate)
                .await
                .unwrap();
        }

        let versions = store.latest_versions(note.id).await.unwrap();
        assert_eq!(versions.len(), VERSION_PAGE_SIZE);
        assert_eq!(versions[0].content, "v24");
        assert_eq!(versions[19].content, "v5");
        assert!(versions.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        // Older snapshots are retained, just not returned
        assert_eq!(store.list_versions(note.id, 100).await.unwrap().len(), 25);
    }

    #[tokio::test]
    async fn update_of_missing_note_is_none() {
        let store = MemoryNoteStore::new();
        assert!(store.update_note_content(Uuid::new_v4(), "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_bumps_timestamp() {
        let store = MemoryNoteStore::new();
        let note = store.create_note("t").await.unwrap();
        let updated = store.update_note_content(note.id, "hello").await.unwrap().unwrap();
        assert_eq!(updated.content, "hello");
        assert!(updated.updated_at >= note.updated_at);
        assert_eq!(store.get_note(note.id).await.unwrap().unwrap().content, "hello");
    }
}
