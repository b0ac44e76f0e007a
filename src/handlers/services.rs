//! Service catalog endpoints. No pagination; the catalog is small.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateService {
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// `GET /services`
#[tracing::instrument(skip(app_state))]
pub async fn get_services(app_state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let services = sqlx::query_as::<_, Service>("SELECT * FROM services ORDER BY created_at DESC")
        .fetch_all(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch services"))?;
    Ok(HttpResponse::Ok().json(services))
}

/// `POST /services`
#[tracing::instrument(skip(app_state, payload), fields(title = %payload.title))]
pub async fn post_service(
    app_state: web::Data<AppState>,
    payload: web::Json<CreateService>,
) -> Result<HttpResponse, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO services (id, title, description, icon, features, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $6)"#,
    )
    .bind(id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.icon)
    .bind(&payload.features)
    .bind(now)
    .execute(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to add service"))?;

    tracing::info!(service_id = %id, "service created");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "acknowledged": true, "insertedId": id })))
}
