use crate::{models::DiagnosticsResponse, AppState};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::{Arc, Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Live room and process statistics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Current diagnostics", body = DiagnosticsResponse)
    )
)]
pub async fn diagnostics(State(state): State<Arc<AppState>>) -> (StatusCode, Json<DiagnosticsResponse>) {
    let registry = &state.registry;

    let mut n_rooms: u32 = 0;
    let mut n_sessions: u32 = 0;
    let mut n_autosave_timers: u32 = 0;
    for note_id in registry.active_rooms().await {
        // Rooms may close between listing and inspection
        if let Some(stats) = registry.room_stats(note_id).await {
            n_rooms += 1;
            n_sessions += stats.sessions as u32;
            if stats.autosave_running {
                n_autosave_timers += 1;
            }
        }
    }

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Rooms: {}, Sessions: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_rooms,
        n_sessions
    );

    (
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_rooms,
            n_sessions,
            n_autosave_timers,
            n_autosave_failures: registry.autosave_failures(),
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    )
}
