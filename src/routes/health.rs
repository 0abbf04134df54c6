use actix_web::{get, http::StatusCode, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::response::ApiEnvelope;

/// Health check endpoint
///
/// Returns the current status of the API and timestamp, in the standard
/// envelope like every other endpoint.
#[get("/health")]
pub async fn health() -> impl Responder {
    ApiEnvelope::respond(
        StatusCode::OK,
        json!({
            "status": "ok",
            "timestamp": Utc::now()
        }),
        "service is healthy",
    )
}
