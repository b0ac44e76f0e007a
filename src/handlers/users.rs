//! User account endpoints.
//!
//! Email uniqueness is enforced by the store's UNIQUE constraint rather than
//! a read-then-insert check, so concurrent creations with the same email
//! cannot race past each other; the loser surfaces as a 409.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(email)]
    pub email: String,
    pub name: Option<String>,
}

/// `GET /users`
#[tracing::instrument(skip(app_state))]
pub async fn get_users(app_state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch users"))?;
    Ok(HttpResponse::Ok().json(users))
}

/// `POST /users`
#[tracing::instrument(skip(app_state, payload))]
pub async fn post_user(
    app_state: web::Data<AppState>,
    payload: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    payload
        .validate()
        .map_err(|_| ApiError::Validation("Email is required".to_string()))?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO users (id, email, name, created_at, updated_at) VALUES ($1, $2, $3, $4, $4)",
    )
    .bind(id)
    .bind(&payload.email)
    .bind(&payload.name)
    .bind(now)
    .execute(app_state.db.as_ref())
    .await;

    match result {
        Ok(_) => {
            tracing::info!(user_id = %id, "user created");
            Ok(HttpResponse::Ok()
                .json(serde_json::json!({ "acknowledged": true, "insertedId": id })))
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(ApiError::Conflict("User already exists".to_string()))
        }
        Err(e) => Err(ApiError::db("Failed to add user")(e)),
    }
}
