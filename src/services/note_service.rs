use tracing::{error, info};
use uuid::Uuid;

use crate::db::{NoteStore, StoreError};
use crate::models::{Note, NoteWithVersions, VersionOrigin};

/// Load a note and its latest snapshots
pub async fn fetch_note_with_versions(store: &dyn NoteStore, id: Uuid) -> Result<Option<NoteWithVersions>, StoreError> {
    let Some(note) = store.get_note(id).await? else {
        info!("Note not found: {}", id);
        return Ok(None);
    };
    let versions = store.latest_versions(id).await?;
    Ok(Some(NoteWithVersions { note, versions }))
}

pub async fn create_note(store: &dyn NoteStore, title: &str) -> Result<Note, StoreError> {
    let note = store.create_note(title.trim()).await?;
    info!("Note {} created with title '{}'", note.id, note.title);
    Ok(note)
}

/// Connection-less content update.
///
/// Keeps the current content when `content` is `None` and always records a
/// `manual-update` snapshot. Live rooms are not notified.
pub async fn update_note_content(
    store: &dyn NoteStore,
    id: Uuid,
    content: Option<String>,
) -> Result<Option<NoteWithVersions>, StoreError> {
    let Some(current) = store.get_note(id).await? else {
        return Ok(None);
    };
    let content = content.unwrap_or(current.content);

    let Some(note) = store.update_note_content(id, &content).await? else {
        return Ok(None);
    };
    if let Err(e) = store.append_version(id, &note.content, VersionOrigin::ManualUpdate).await {
        error!("Failed to snapshot manual update of note {}: {}", id, e);
        return Err(e);
    }
    let versions = store.latest_versions(id).await?;
    Ok(Some(NoteWithVersions { note, versions }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryNoteStore;

    #[tokio::test]
    async fn manual_update_snapshots_and_keeps_content_when_absent() {
        let store = MemoryNoteStore::new();
        let note = create_note(&store, "  Draft  ").await.unwrap();
        assert_eq!(note.title, "Draft");

        let updated = update_note_content(&store, note.id, Some("body".into())).await.unwrap().unwrap();
        assert_eq!(updated.note.content, "body");
        assert_eq!(updated.versions.len(), 1);
        assert_eq!(updated.versions[0].origin, VersionOrigin::ManualUpdate);

        let kept = update_note_content(&store, note.id, None).await.unwrap().unwrap();
        assert_eq!(kept.note.content, "body");
        assert_eq!(kept.versions.len(), 2);
    }

    #[tokio::test]
    async fn missing_note_is_none() {
        let store = MemoryNoteStore::new();
        assert!(fetch_note_with_versions(&store, Uuid::new_v4()).await.unwrap().is_none());
        assert!(update_note_content(&store, Uuid::new_v4(), Some("x".into())).await.unwrap().is_none());
    }
}
