pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod websocket;
pub mod ws;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use db::NoteStore;
use docs::ApiDoc;
use routes::create_api_routes;
use ws::{RoomRegistry, RoomSettings};

/// Shared state of the running service
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn NoteStore>,
    pub registry: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn NoteStore>) -> Self {
        let settings = RoomSettings {
            autosave_interval: config.autosave_interval(),
        };
        let registry = Arc::new(RoomRegistry::new(store.clone(), settings));
        Self { config, store, registry }
    }
}

/// Build the full HTTP and WebSocket router
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/ws", get(websocket::websocket_handler))
        .route("/health", get(handlers::health_check))
        .with_state(state.clone())
        // Mount API routes
        .nest("/api", create_api_routes(state))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(cors)
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
