use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Note, NoteWithVersions};

/// Request body for creating a note
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct CreateNoteRequest {
    pub title: Option<String>,
}

/// Request body for the connection-less content update
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct UpdateNoteRequest {
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct NoteResponse {
    pub success: bool,
    pub message: String,
    pub data: Note,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct NoteWithVersionsResponse {
    pub success: bool,
    pub message: String,
    pub data: NoteWithVersions,
}
