//! Admin login endpoint.
//!
//! One fixed credential pair (env-configurable) is valid; success returns a
//! signed bearer token carrying `{id, username, role, iat, exp}` with a
//! 24-hour expiry. There is no refresh flow.

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;

use crate::{AppState, auth_middleware};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/login`
///
/// Success: `{success, token, user, expiresIn}`. Failure: 401 with
/// `code: "INVALID_CREDENTIALS"`.
#[tracing::instrument(skip(app_state, payload), fields(username = %payload.username))]
pub async fn login(
    app_state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> impl Responder {
    if payload.username != app_state.admin_username
        || payload.password != app_state.admin_password
    {
        tracing::warn!(username = %payload.username, "login rejected, invalid credentials");
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid credentials",
            "code": "INVALID_CREDENTIALS",
        }));
    }

    match auth_middleware::issue_admin_token(&payload.username, &app_state.jwt_secret) {
        Ok((token, claims)) => {
            tracing::info!(username = %claims.username, "admin login successful");
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "token": token,
                "user": {
                    "id": claims.id,
                    "username": claims.username,
                    "role": claims.role,
                },
                "expiresIn": "24h",
            }))
        }
        Err(e) => {
            tracing::error!(error = ?e, "failed to sign admin token");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Authentication failed",
                "code": "AUTH_FAILED",
            }))
        }
    }
}
