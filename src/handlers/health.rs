//! Liveness endpoints.
//!
//! Provides the root banner and a JSON health check for monitoring and
//! orchestration.

use actix_web::{HttpResponse, Responder};

#[tracing::instrument]
pub async fn root_banner() -> impl Responder {
    HttpResponse::Ok().body("Atelier backend is running!")
}

#[tracing::instrument]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}
