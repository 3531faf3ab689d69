use crate::ScanError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ScanError {
    pub fn status_code(&self) -> StatusCode {
        if !self.is_client_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            ScanError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::warn!("Request failed: {}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

impl From<JsonRejection> for ScanError {
    fn from(rejection: JsonRejection) -> Self {
        ScanError::InvalidRequest(rejection.body_text())
    }
}
