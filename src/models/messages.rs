use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::NoteVersion;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct JoinNoteMessage {
    #[serde(alias = "noteId")]
    pub document_id: Option<String>,
    #[serde(alias = "userName")]
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdateMessage {
    #[serde(alias = "noteId")]
    pub document_id: Option<String>,
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CursorUpdateMessage {
    #[serde(alias = "noteId")]
    pub document_id: Option<String>,
    pub cursor_position: Option<Value>,
    pub selection: Option<Value>,
}

/// Messages a client may send over its socket
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReceivedMessage {
    JoinNote(JoinNoteMessage),
    NoteUpdate(NoteUpdateMessage),
    CursorUpdate(CursorUpdateMessage),
    Ping,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteLoadedMessage {
    pub document_id: Uuid,
    pub content: String,
    pub updated_at: DateTime<Utc>,
    pub versions: Vec<NoteVersion>,
}

/// One entry of a presence snapshot
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    pub connection_id: String,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUsersMessage {
    pub document_id: Uuid,
    pub users: Vec<ActiveUser>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdateBroadcastMessage {
    pub document_id: Uuid,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VersionsUpdatedMessage {
    pub versions: Vec<NoteVersion>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CursorBroadcastMessage {
    pub connection_id: String,
    pub cursor_position: Option<Value>,
    pub selection: Option<Value>,
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CursorLeaveMessage {
    pub connection_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveMessage {
    pub document_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PongMessage {
    pub date: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorMessage {
    pub message: String,
}

/// Messages the server pushes to a client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SendMessage {
    NoteLoaded(NoteLoadedMessage),
    ActiveUsers(ActiveUsersMessage),
    NoteUpdateBroadcast(NoteUpdateBroadcastMessage),
    VersionsUpdated(VersionsUpdatedMessage),
    CursorUpdate(CursorBroadcastMessage),
    CursorLeave(CursorLeaveMessage),
    Autosave(AutosaveMessage),
    Pong(PongMessage),
    Error(ErrorMessage),
}

impl SendMessage {
    pub fn error(message: impl Into<String>) -> Self {
        SendMessage::Error(ErrorMessage { message: message.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_accepts_legacy_field_names() {
        let msg: ReceivedMessage = serde_json::from_value(json!({
            "type": "join_note",
            "noteId": "abc",
            "userName": "Ada",
        }))
        .unwrap();
        match msg {
            ReceivedMessage::JoinNote(join) => {
                assert_eq!(join.document_id.as_deref(), Some("abc"));
                assert_eq!(join.display_name.as_deref(), Some("Ada"));
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn update_without_content_still_parses() {
        let msg: ReceivedMessage =
            serde_json::from_value(json!({"type": "note_update", "documentId": "abc"})).unwrap();
        assert!(matches!(msg, ReceivedMessage::NoteUpdate(NoteUpdateMessage { content: None, .. })));
    }

    #[test]
    fn ping_needs_no_payload() {
        let msg: ReceivedMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ReceivedMessage::Ping));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ReceivedMessage>(r#"{"type":"delete_note"}"#).is_err());
    }

    #[test]
    fn outbound_messages_are_type_tagged() {
        let leave = SendMessage::CursorLeave(CursorLeaveMessage { connection_id: "c1".into() });
        assert_eq!(
            serde_json::to_value(&leave).unwrap(),
            json!({"type": "cursor_leave", "connectionId": "c1"})
        );
        assert_eq!(
            serde_json::to_value(SendMessage::error("nope")).unwrap(),
            json!({"type": "error", "message": "nope"})
        );
    }
}
