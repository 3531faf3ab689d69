//! HTTP API
//!
//! Four JSON endpoints in front of the [`ScanJobManager`]:
//!
//! | method | path                            | purpose              |
//! |--------|---------------------------------|----------------------|
//! | GET    | `/api/status`                   | liveness             |
//! | POST   | `/api/scan/start`               | start a scan         |
//! | GET    | `/api/scan/progress/{scanId}`   | poll progress        |
//! | GET    | `/api/scan/results/{scanId}`    | fetch the result     |
//!
//! Clients are expected to poll progress every 500ms or so until
//! `completed` is true, then fetch the result once.

mod error;
pub mod handlers;

use crate::jobs::ScanJobManager;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

/// Shared state injected into every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub manager: ScanJobManager,
}

impl AppState {
    pub fn new(manager: ScanJobManager) -> Self {
        Self { manager }
    }
}

/// Build the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(handlers::status))
        .route("/api/scan/start", post(handlers::start_scan))
        .route("/api/scan/progress/{scan_id}", get(handlers::scan_progress))
        .route("/api/scan/results/{scan_id}", get(handlers::scan_results))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
