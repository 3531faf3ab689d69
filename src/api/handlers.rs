//! Request handlers

use super::AppState;
use crate::jobs::{JobProgress, ScanRequest};
use crate::normalize::ScanResult;
use crate::ScanError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartScanResponse {
    pub scan_id: String,
}

/// GET /api/status - liveness probe for clients
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// POST /api/scan/start - register a scan and return its id
pub async fn start_scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<StartScanResponse>, ScanError> {
    let Json(request) = payload?;
    let id = state.manager.start_scan(request).await?;
    Ok(Json(StartScanResponse {
        scan_id: id.to_string(),
    }))
}

/// GET /api/scan/progress/{scanId}
pub async fn scan_progress(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> Result<Json<JobProgress>, ScanError> {
    Ok(Json(state.manager.get_progress(&scan_id).await?))
}

/// GET /api/scan/results/{scanId}
pub async fn scan_results(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> Result<Json<ScanResult>, ScanError> {
    Ok(Json(state.manager.get_result(&scan_id).await?))
}
