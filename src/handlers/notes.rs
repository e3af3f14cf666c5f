use crate::{
    models::{
        parse_note_id, CreateNoteRequest, ErrorResponse, NoteResponse, NoteWithVersionsResponse, UpdateNoteRequest,
    },
    services::note_service,
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    parse_note_id(raw).map_err(|e| {
        warn!("Invalid note ID '{}': {}", raw, e);
        ErrorResponse::with_status(StatusCode::BAD_REQUEST, "Invalid note ID format")
    })
}

/// Create a new note
#[utoipa::path(
    post,
    path = "/api/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 400, description = "Title missing", body = ErrorResponse)
    )
)]
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let Some(title) = request.title.as_deref().filter(|t| !t.trim().is_empty()) else {
        return Err(ErrorResponse::with_status(StatusCode::BAD_REQUEST, "Title is required"));
    };

    let note = note_service::create_note(state.store.as_ref(), title).await.map_err(|e| {
        error!("Failed to create note: {}", e);
        ErrorResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create note")
    })?;

    Ok((
        StatusCode::CREATED,
        Json(NoteResponse {
            success: true,
            message: "Note successfully created".to_string(),
            data: note,
        }),
    ))
}

/// Get a note with its latest versions
#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    params(("id" = String, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note found", body = NoteWithVersionsResponse),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "Unknown note", body = ErrorResponse)
    )
)]
pub async fn get_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<NoteWithVersionsResponse>), ApiError> {
    let note_id = parse_id(&id)?;

    match note_service::fetch_note_with_versions(state.store.as_ref(), note_id).await {
        Ok(Some(data)) => Ok((
            StatusCode::OK,
            Json(NoteWithVersionsResponse {
                success: true,
                message: "Note fetched successfully".to_string(),
                data,
            }),
        )),
        Ok(None) => Err(ErrorResponse::with_status(StatusCode::NOT_FOUND, "Note not found")),
        Err(e) => {
            error!("Error loading note '{}': {}", note_id, e);
            Err(ErrorResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load note"))
        }
    }
}

/// Update note content without a live connection
#[utoipa::path(
    put,
    path = "/api/notes/{id}",
    params(("id" = String, Path, description = "Note ID")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated", body = NoteWithVersionsResponse),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "Unknown note", body = ErrorResponse)
    )
)]
pub async fn update_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<(StatusCode, Json<NoteWithVersionsResponse>), ApiError> {
    let note_id = parse_id(&id)?;

    match note_service::update_note_content(state.store.as_ref(), note_id, request.content).await {
        Ok(Some(data)) => Ok((
            StatusCode::OK,
            Json(NoteWithVersionsResponse {
                success: true,
                message: "Note updated successfully".to_string(),
                data,
            }),
        )),
        Ok(None) => Err(ErrorResponse::with_status(StatusCode::NOT_FOUND, "Note not found")),
        Err(e) => {
            error!("Error updating note '{}': {}", note_id, e);
            Err(ErrorResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update note"))
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ErrorResponse::with_status(StatusCode::NOT_FOUND, "Route not found")
}
