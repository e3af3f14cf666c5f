use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A shared text document
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What produced a version snapshot
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum VersionOrigin {
    Autosave,
    ManualUpdate,
    SocketUpdate,
}

impl VersionOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionOrigin::Autosave => "autosave",
            VersionOrigin::ManualUpdate => "manual-update",
            VersionOrigin::SocketUpdate => "socket-update",
        }
    }
}

impl fmt::Display for VersionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "autosave" => Ok(VersionOrigin::Autosave),
            "manual-update" => Ok(VersionOrigin::ManualUpdate),
            "socket-update" => Ok(VersionOrigin::SocketUpdate),
            other => Err(format!("Unknown version origin '{}'", other)),
        }
    }
}

/// Immutable point-in-time copy of a note's content
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteVersion {
    pub id: Uuid,
    #[serde(rename = "documentId")]
    pub note_id: Uuid,
    pub content: String,
    pub origin: VersionOrigin,
    pub created_at: DateTime<Utc>,
}

/// A note together with its most recent snapshots, newest first
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct NoteWithVersions {
    pub note: Note,
    pub versions: Vec<NoteVersion>,
}

/// Parse a note ID as received from a client
pub fn parse_note_id(raw: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(raw.trim())
}
