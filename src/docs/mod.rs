use utoipa::OpenApi;
use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::notes::create_note,
        handlers::notes::get_note,
        handlers::notes::update_note,
        handlers::diagnostics::diagnostics,
    ),
    components(
        schemas(
            Note,
            NoteVersion,
            VersionOrigin,
            NoteWithVersions,
            CreateNoteRequest,
            UpdateNoteRequest,
            NoteResponse,
            NoteWithVersionsResponse,
            ErrorResponse,
            HealthResponse,
            DiagnosticsResponse,
        )
    ),
    tags(
        (name = "notes", description = "Collaborative notes API")
    )
)]
pub struct ApiDoc;
