//! Media library endpoints.
//!
//! Rows describe uploaded assets by URL; the server never stores file bytes.
//! Listing supports search, a type filter, and whitelisted sort columns, and
//! every listing response carries per-type stats for the library sidebar.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    AppState,
    auth_middleware::AdminUser,
    coerce::as_int,
    error::{ApiError, parse_id},
    pagination::{SqlWhere, page_window, push_search, total_pages},
};

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: Uuid,
    pub name: String,
    pub original_name: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub media_type: String,
    pub size: i64,
    pub url: String,
    pub display_url: Option<String>,
    pub thumb_url: Option<String>,
    pub medium_url: Option<String>,
    pub delete_url: Option<String>,
    pub alt: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub storage_provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedia {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub size: Option<serde_json::Value>,
    pub url: Option<String>,
    pub original_name: Option<String>,
    pub display_url: Option<String>,
    pub thumb_url: Option<String>,
    pub medium_url: Option<String>,
    pub delete_url: Option<String>,
    pub alt: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub storage_provider: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedia {
    pub name: Option<String>,
    pub alt: Option<String>,
    pub original_name: Option<String>,
    pub display_url: Option<String>,
    pub thumb_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDelete {
    pub ids: Option<Vec<String>>,
}

/// Maps a client sort key onto a real column; unknown keys fall back to
/// creation time so the clause is never attacker-controlled.
fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by {
        Some("name") => "name",
        Some("size") => "size",
        Some("type") => "type",
        Some("updatedAt") => "updated_at",
        _ => "created_at",
    }
}

fn sort_direction(sort_order: Option<&str>) -> &'static str {
    match sort_order {
        Some("asc") => "ASC",
        _ => "DESC",
    }
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &MediaListQuery) {
    let mut clause = SqlWhere::new();
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        push_search(qb, &mut clause, search, &["name", "original_name", "alt"]);
    }
    if let Some(kind) = query
        .media_type
        .as_deref()
        .filter(|t| !t.is_empty() && *t != "All Types")
    {
        clause.prefix(qb);
        qb.push("type = ");
        qb.push_bind(kind.to_string());
    }
}

async fn media_stats(pool: &sqlx::PgPool) -> Result<serde_json::Value, sqlx::Error> {
    let row: (i64, i64, i64, i64, i64, i64) = sqlx::query_as(
        r#"SELECT COUNT(*),
                  COUNT(*) FILTER (WHERE type = 'Image'),
                  COUNT(*) FILTER (WHERE type = 'Document'),
                  COUNT(*) FILTER (WHERE type = 'Video'),
                  COUNT(*) FILTER (WHERE type = 'Audio'),
                  COALESCE(SUM(size), 0)::bigint
           FROM media"#,
    )
    .fetch_one(pool)
    .await?;
    Ok(serde_json::json!({
        "total": row.0,
        "images": row.1,
        "documents": row.2,
        "videos": row.3,
        "audio": row.4,
        "totalSize": row.5,
    }))
}

/// `GET /api/media` (admin)
#[tracing::instrument(skip(admin, app_state, query), fields(admin = %admin.username))]
pub async fn get_media_list(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    query: web::Query<MediaListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (page, limit, offset) = page_window(query.page, query.limit, 20);

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM media");
    apply_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch media"))?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM media");
    apply_filters(&mut qb, &query);
    qb.push(format!(
        " ORDER BY {} {} LIMIT ",
        sort_column(query.sort_by.as_deref()),
        sort_direction(query.sort_order.as_deref()),
    ));
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    let media = qb
        .build_query_as::<MediaItem>()
        .fetch_all(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch media"))?;

    let stats = media_stats(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch media"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "media": media,
        "total": total,
        "page": page,
        "limit": limit,
        "totalPages": total_pages(total, limit),
        "stats": stats,
    })))
}

/// `GET /api/media/test` — connectivity probe for the admin uploader.
pub async fn get_media_test() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Media API is working",
    }))
}

/// `GET /api/media/{id}` (admin)
#[tracing::instrument(skip(admin, app_state), fields(admin = %admin.username))]
pub async fn get_media_item(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Media")?;
    let item = sqlx::query_as::<_, MediaItem>("SELECT * FROM media WHERE id = $1")
        .bind(id)
        .fetch_optional(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch media"))?
        .ok_or(ApiError::NotFound("Media"))?;
    Ok(HttpResponse::Ok().json(item))
}

/// `POST /api/media` (admin) — registers an already-uploaded asset.
#[tracing::instrument(skip(admin, app_state, payload), fields(admin = %admin.username))]
pub async fn post_media(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    payload: web::Json<CreateMedia>,
) -> Result<HttpResponse, ApiError> {
    // zero-byte sizes are treated as missing
    let size = payload.size.as_ref().and_then(as_int).filter(|s| *s != 0);
    let (Some(name), Some(media_type), Some(size)) =
        (payload.name.as_deref(), payload.media_type.as_deref(), size)
    else {
        return Err(ApiError::Validation(
            "Missing required fields: name, type, size".to_string(),
        ));
    };

    let id = Uuid::new_v4();
    let now = Utc::now();
    let url = payload.url.clone().unwrap_or_default();
    let provider = payload
        .storage_provider
        .clone()
        .unwrap_or_else(|| "local".to_string());
    let created = sqlx::query_as::<_, MediaItem>(
        r#"INSERT INTO media
           (id, name, original_name, type, size, url, display_url, thumb_url, medium_url,
            delete_url, alt, mime_type, width, height, storage_provider, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
           RETURNING *"#,
    )
    .bind(id)
    .bind(name)
    .bind(payload.original_name.as_deref().unwrap_or(name))
    .bind(media_type)
    .bind(size)
    .bind(&url)
    .bind(payload.display_url.as_deref().unwrap_or(&url))
    .bind(&payload.thumb_url)
    .bind(&payload.medium_url)
    .bind(&payload.delete_url)
    .bind(payload.alt.as_deref().unwrap_or(""))
    .bind(payload.mime_type.as_deref().unwrap_or(""))
    .bind(payload.width)
    .bind(payload.height)
    .bind(&provider)
    .bind(now)
    .fetch_one(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to save media"))?;

    let suffix = if provider == "imgbb" { " to ImgBB" } else { "" };
    tracing::info!(media_id = %id, provider = %provider, "media registered");
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": format!("Media saved successfully{suffix}"),
        "media": created,
    })))
}

/// `PUT /api/media/{id}` (admin)
#[tracing::instrument(skip(admin, app_state, payload), fields(admin = %admin.username))]
pub async fn put_media(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateMedia>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Media")?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE media SET updated_at = ");
    qb.push_bind(Utc::now());
    if let Some(name) = &payload.name {
        qb.push(", name = ");
        qb.push_bind(name);
    }
    if let Some(alt) = &payload.alt {
        qb.push(", alt = ");
        qb.push_bind(alt);
    }
    if let Some(original_name) = &payload.original_name {
        qb.push(", original_name = ");
        qb.push_bind(original_name);
    }
    if let Some(display_url) = &payload.display_url {
        qb.push(", display_url = ");
        qb.push_bind(display_url);
    }
    if let Some(thumb_url) = &payload.thumb_url {
        qb.push(", thumb_url = ");
        qb.push_bind(thumb_url);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");

    let updated = qb
        .build_query_as::<MediaItem>()
        .fetch_optional(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to update media"))?
        .ok_or(ApiError::NotFound("Media"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Media updated successfully",
        "media": updated,
    })))
}

/// `DELETE /api/media` (admin) — bulk delete by id list.
#[tracing::instrument(skip(admin, app_state, payload), fields(admin = %admin.username))]
pub async fn delete_media_bulk(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    payload: web::Json<BulkDelete>,
) -> Result<HttpResponse, ApiError> {
    let raw_ids = payload.ids.as_deref().unwrap_or_default();
    if raw_ids.is_empty() {
        return Err(ApiError::Validation("Invalid or empty ids array".to_string()));
    }
    let ids: Vec<Uuid> = raw_ids
        .iter()
        .filter_map(|raw| Uuid::parse_str(raw).ok())
        .collect();

    let result = sqlx::query("DELETE FROM media WHERE id = ANY($1)")
        .bind(&ids)
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to delete media"))?;

    let deleted = result.rows_affected();
    tracing::info!(deleted, "bulk media delete");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("{deleted} media items deleted successfully"),
        "deletedCount": deleted,
    })))
}

/// `DELETE /api/media/{id}` (admin)
#[tracing::instrument(skip(admin, app_state), fields(admin = %admin.username))]
pub async fn delete_media(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Media")?;
    let result = sqlx::query("DELETE FROM media WHERE id = $1")
        .bind(id)
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to delete media"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Media"));
    }
    tracing::info!(media_id = %id, "media deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Media deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_map_to_whitelisted_columns() {
        assert_eq!(sort_column(Some("name")), "name");
        assert_eq!(sort_column(Some("updatedAt")), "updated_at");
        assert_eq!(sort_column(Some("created_at; DROP TABLE media")), "created_at");
        assert_eq!(sort_column(None), "created_at");
    }

    #[test]
    fn sort_order_defaults_to_descending() {
        assert_eq!(sort_direction(Some("asc")), "ASC");
        assert_eq!(sort_direction(Some("desc")), "DESC");
        assert_eq!(sort_direction(None), "DESC");
    }
}
