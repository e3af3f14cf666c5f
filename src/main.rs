use std::panic;
use std::sync::Arc;

use notes_collab::config::Config;
use notes_collab::db::{MemoryNoteStore, NoteStore, PgNoteStore};
use notes_collab::{build_app, AppState};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "notes_collab=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    let store = open_store(&config).await;
    let state = Arc::new(AppState::new(config, store));

    // Surface autosave failures that have no caller to report to
    let mut background_errors = state.registry.subscribe_background_errors();
    tokio::spawn(async move {
        loop {
            match background_errors.recv().await {
                Ok(e) => warn!("Background error on note {}: {}", e.note_id, e.message),
                Err(RecvError::Lagged(n)) => warn!("Missed {} background errors", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let address = state.config.server_address();
    let app = build_app(state.clone());

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("🚀 {} running on http://{}", state.config.service_name, address);
    info!("📡 WebSocket available at ws://{}/ws", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}

async fn open_store(config: &Config) -> Arc<dyn NoteStore> {
    let Some(db_url) = &config.db_url else {
        warn!("No database URL configured - notes are kept in memory only");
        return Arc::new(MemoryNoteStore::new());
    };

    match PgNoteStore::new(db_url).await {
        Ok(store) => {
            if let Err(e) = store.ensure_schema().await {
                error!("Failed to prepare database schema: {}", e);
            }
            info!("Database initialized successfully");
            Arc::new(store)
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            warn!("Falling back to the in-memory note store");
            Arc::new(MemoryNoteStore::new())
        }
    }
}
