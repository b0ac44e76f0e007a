//! Project portfolio endpoints.
//!
//! List supports free-text search over title/description/client name, an
//! Active/Inactive status filter, and a category filter. "All Status" and
//! "All Categories" are accepted as no-ops so the admin UI can send its
//! dropdown defaults verbatim.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, parse_id},
    pagination::{SqlWhere, page_window, push_search, total_pages},
};

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub title: String,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProjectListQuery) {
    let mut clause = SqlWhere::new();
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        push_search(
            qb,
            &mut clause,
            search,
            &["title", "description", "client_name"],
        );
    }
    match query.status.as_deref() {
        Some("Active") => {
            clause.prefix(qb);
            qb.push("is_active = TRUE");
        }
        Some("Inactive") => {
            clause.prefix(qb);
            qb.push("is_active = FALSE");
        }
        _ => {}
    }
    if let Some(category) = query
        .category
        .as_deref()
        .filter(|c| !c.is_empty() && *c != "All Categories")
    {
        clause.prefix(qb);
        qb.push("category = ");
        qb.push_bind(category.to_string());
    }
}

/// `GET /projects`
#[tracing::instrument(skip(app_state, query))]
pub async fn get_projects(
    app_state: web::Data<AppState>,
    query: web::Query<ProjectListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (page, limit, offset) = page_window(query.page, query.limit, 10);

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects");
    apply_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch projects"))?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM projects");
    apply_filters(&mut qb, &query);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    let projects = qb
        .build_query_as::<Project>()
        .fetch_all(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch projects"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "projects": projects,
        "total": total,
        "page": page,
        "limit": limit,
        "totalPages": total_pages(total, limit),
    })))
}

/// `GET /projects/{id}`
#[tracing::instrument(skip(app_state))]
pub async fn get_project(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Project")?;
    let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch project"))?
        .ok_or(ApiError::NotFound("Project"))?;
    Ok(HttpResponse::Ok().json(project))
}

/// `POST /projects`
#[tracing::instrument(skip(app_state, payload), fields(title = %payload.title))]
pub async fn post_project(
    app_state: web::Data<AppState>,
    payload: web::Json<CreateProject>,
) -> Result<HttpResponse, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO projects
           (id, title, description, client_name, category, image_url, is_active, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)"#,
    )
    .bind(id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.client_name)
    .bind(&payload.category)
    .bind(&payload.image_url)
    .bind(payload.is_active.unwrap_or(true))
    .bind(now)
    .execute(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to create project"))?;

    tracing::info!(project_id = %id, "project created");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "acknowledged": true, "insertedId": id })))
}

/// `PUT /projects/{id}`
#[tracing::instrument(skip(app_state, payload))]
pub async fn put_project(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateProject>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Project")?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE projects SET updated_at = ");
    qb.push_bind(Utc::now());
    if let Some(title) = &payload.title {
        qb.push(", title = ");
        qb.push_bind(title);
    }
    if let Some(description) = &payload.description {
        qb.push(", description = ");
        qb.push_bind(description);
    }
    if let Some(client_name) = &payload.client_name {
        qb.push(", client_name = ");
        qb.push_bind(client_name);
    }
    if let Some(category) = &payload.category {
        qb.push(", category = ");
        qb.push_bind(category);
    }
    if let Some(image_url) = &payload.image_url {
        qb.push(", image_url = ");
        qb.push_bind(image_url);
    }
    if let Some(is_active) = payload.is_active {
        qb.push(", is_active = ");
        qb.push_bind(is_active);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);

    let result = qb
        .build()
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to update project"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Project"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "matchedCount": 1,
        "modifiedCount": 1,
    })))
}

/// `DELETE /projects/{id}`
#[tracing::instrument(skip(app_state))]
pub async fn delete_project(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Project")?;
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to delete project"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Project"));
    }
    tracing::info!(project_id = %id, "project deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Project deleted successfully" })))
}
