//! Team member endpoints.
//!
//! Listing sorts by display order first, newest second, so pagination stays
//! stable while admins reorder the page. Search also matches entries of the
//! expertise list.

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
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub position: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub expertise: Vec<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TeamListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub active: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamMember {
    pub name: String,
    pub position: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamMember {
    pub name: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub expertise: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &TeamListQuery) {
    let mut clause = SqlWhere::new();
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        push_search(
            qb,
            &mut clause,
            search,
            &[
                "name",
                "position",
                "email",
                "array_to_string(expertise, ' ')",
            ],
        );
    }
    match query.active.as_deref() {
        Some("true") => {
            clause.prefix(qb);
            qb.push("is_active = TRUE");
        }
        Some("false") => {
            clause.prefix(qb);
            qb.push("is_active = FALSE");
        }
        _ => {}
    }
}

/// `GET /team-members`
#[tracing::instrument(skip(app_state, query))]
pub async fn get_team_members(
    app_state: web::Data<AppState>,
    query: web::Query<TeamListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (page, limit, offset) = page_window(query.page, query.limit, 10);

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM team_members");
    apply_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch team members"))?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM team_members");
    apply_filters(&mut qb, &query);
    qb.push(" ORDER BY display_order ASC, created_at DESC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    let team_members = qb
        .build_query_as::<TeamMember>()
        .fetch_all(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch team members"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "teamMembers": team_members,
        "total": total,
        "page": page,
        "limit": limit,
        "totalPages": total_pages(total, limit),
    })))
}

/// `GET /team-members/{id}`
#[tracing::instrument(skip(app_state))]
pub async fn get_team_member(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Team member")?;
    let member = sqlx::query_as::<_, TeamMember>("SELECT * FROM team_members WHERE id = $1")
        .bind(id)
        .fetch_optional(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch team member"))?
        .ok_or(ApiError::NotFound("Team member"))?;
    Ok(HttpResponse::Ok().json(member))
}

/// `POST /team-members` — new members default to active.
#[tracing::instrument(skip(app_state, payload), fields(name = %payload.name))]
pub async fn post_team_member(
    app_state: web::Data<AppState>,
    payload: web::Json<CreateTeamMember>,
) -> Result<HttpResponse, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO team_members
           (id, name, position, email, bio, image_url, expertise, is_active, display_order, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)"#,
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.position)
    .bind(&payload.email)
    .bind(&payload.bio)
    .bind(&payload.image_url)
    .bind(&payload.expertise)
    .bind(payload.is_active.unwrap_or(true))
    .bind(payload.display_order.unwrap_or(0))
    .bind(now)
    .execute(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to create team member"))?;

    tracing::info!(team_member_id = %id, "team member created");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "acknowledged": true, "insertedId": id })))
}

/// `PUT /team-members/{id}`
#[tracing::instrument(skip(app_state, payload))]
pub async fn put_team_member(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateTeamMember>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Team member")?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE team_members SET updated_at = ");
    qb.push_bind(Utc::now());
    if let Some(name) = &payload.name {
        qb.push(", name = ");
        qb.push_bind(name);
    }
    if let Some(position) = &payload.position {
        qb.push(", position = ");
        qb.push_bind(position);
    }
    if let Some(email) = &payload.email {
        qb.push(", email = ");
        qb.push_bind(email);
    }
    if let Some(bio) = &payload.bio {
        qb.push(", bio = ");
        qb.push_bind(bio);
    }
    if let Some(image_url) = &payload.image_url {
        qb.push(", image_url = ");
        qb.push_bind(image_url);
    }
    if let Some(expertise) = &payload.expertise {
        qb.push(", expertise = ");
        qb.push_bind(expertise);
    }
    if let Some(is_active) = payload.is_active {
        qb.push(", is_active = ");
        qb.push_bind(is_active);
    }
    if let Some(display_order) = payload.display_order {
        qb.push(", display_order = ");
        qb.push_bind(display_order);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);

    let result = qb
        .build()
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to update team member"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Team member"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "matchedCount": 1,
        "modifiedCount": 1,
    })))
}

/// `DELETE /team-members/{id}`
#[tracing::instrument(skip(app_state))]
pub async fn delete_team_member(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Team member")?;
    let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
        .bind(id)
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to delete team member"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Team member"));
    }
    tracing::info!(team_member_id = %id, "team member deleted");
    Ok(HttpResponse::Ok()
        .json(serde_json::json!({ "message": "Team member deleted successfully" })))
}
