use crate::{
    handlers::{create_note, diagnostics, get_note, update_note},
    AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::<Arc<AppState>>::new()
        .route("/notes", post(create_note))
        .route("/notes/:id", get(get_note).put(update_note))
        .route("/v1/diagnostics", get(diagnostics))
        .with_state(state)
}
