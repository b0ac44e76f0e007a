//! Testimonial endpoints.
//!
//! Two listing surfaces exist: the admin listing is paginated and filterable
//! across the whole collection, while the public listing is unauthenticated
//! and defaults to active entries only. Rating and display order accept
//! numbers or numeric strings; zero and garbage fall back to the defaults
//! (5 and 0) on both create and update.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    AppState,
    auth_middleware::AdminUser,
    coerce,
    error::{ApiError, parse_id},
    pagination::{SqlWhere, page_window, push_search, total_pages},
};

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub position: Option<String>,
    pub rating: i32,
    pub testimonial: Option<String>,
    pub featured: bool,
    pub active: bool,
    pub display_order: i32,
    pub date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct TestimonialListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub featured: Option<String>,
    pub active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PublicTestimonialQuery {
    pub featured: Option<String>,
    pub active: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestimonial {
    pub name: String,
    pub company: Option<String>,
    pub position: Option<String>,
    pub testimonial: Option<String>,
    pub rating: Option<Value>,
    pub display_order: Option<Value>,
    pub featured: Option<bool>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTestimonial {
    pub name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub testimonial: Option<String>,
    pub rating: Option<Value>,
    pub display_order: Option<Value>,
    pub featured: Option<bool>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct FeaturedToggle {
    pub featured: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActiveToggle {
    pub active: bool,
}

fn push_flag(qb: &mut QueryBuilder<'_, Postgres>, clause: &mut SqlWhere, column: &str, raw: &str) {
    // "all" (and anything unparseable) leaves the filter off.
    match raw {
        "true" => {
            clause.prefix(qb);
            qb.push(column);
            qb.push(" = TRUE");
        }
        "false" => {
            clause.prefix(qb);
            qb.push(column);
            qb.push(" = FALSE");
        }
        _ => {}
    }
}

fn apply_admin_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &TestimonialListQuery) {
    let mut clause = SqlWhere::new();
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        push_search(
            qb,
            &mut clause,
            search,
            &["name", "company", "position", "testimonial"],
        );
    }
    if let Some(featured) = query.featured.as_deref() {
        push_flag(qb, &mut clause, "featured", featured);
    }
    if let Some(active) = query.active.as_deref() {
        push_flag(qb, &mut clause, "active", active);
    }
}

/// `GET /api/testimonials` (admin)
#[tracing::instrument(skip(admin, app_state, query), fields(admin = %admin.username))]
pub async fn get_testimonials_admin(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    query: web::Query<TestimonialListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (page, limit, offset) = page_window(query.page, query.limit, 10);

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM testimonials");
    apply_admin_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch testimonials"))?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM testimonials");
    apply_admin_filters(&mut qb, &query);
    qb.push(" ORDER BY display_order ASC, created_at DESC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    let testimonials = qb
        .build_query_as::<Testimonial>()
        .fetch_all(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch testimonials"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "testimonials": testimonials,
        "total": total,
        "page": page,
        "limit": limit,
        "totalPages": total_pages(total, limit),
    })))
}

/// `GET /testimonials` — public listing, active by default.
#[tracing::instrument(skip(app_state, query))]
pub async fn get_testimonials_public(
    app_state: web::Data<AppState>,
    query: web::Query<PublicTestimonialQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM testimonials");
    let mut clause = SqlWhere::new();
    if let Some(featured) = query.featured.as_deref() {
        push_flag(&mut qb, &mut clause, "featured", featured);
    }
    push_flag(
        &mut qb,
        &mut clause,
        "active",
        query.active.as_deref().unwrap_or("true"),
    );
    qb.push(" ORDER BY display_order ASC, created_at DESC");

    let testimonials = qb
        .build_query_as::<Testimonial>()
        .fetch_all(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch testimonials"))?;
    Ok(HttpResponse::Ok().json(testimonials))
}

/// `GET /api/testimonials/{id}` (admin)
#[tracing::instrument(skip(admin, app_state), fields(admin = %admin.username))]
pub async fn get_testimonial(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Testimonial")?;
    let testimonial = sqlx::query_as::<_, Testimonial>("SELECT * FROM testimonials WHERE id = $1")
        .bind(id)
        .fetch_optional(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch testimonial"))?
        .ok_or(ApiError::NotFound("Testimonial"))?;
    Ok(HttpResponse::Ok().json(testimonial))
}

/// `POST /api/testimonials` (admin) — returns the created row.
#[tracing::instrument(skip(admin, app_state, payload), fields(admin = %admin.username))]
pub async fn post_testimonial(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    payload: web::Json<CreateTestimonial>,
) -> Result<HttpResponse, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let created = sqlx::query_as::<_, Testimonial>(
        r#"INSERT INTO testimonials
           (id, name, company, position, rating, testimonial, featured, active, display_order, date, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
           RETURNING *"#,
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.company)
    .bind(&payload.position)
    .bind(coerce::int_or(payload.rating.as_ref(), 5) as i32)
    .bind(&payload.testimonial)
    .bind(payload.featured.unwrap_or(false))
    .bind(payload.active.unwrap_or(true))
    .bind(coerce::int_or(payload.display_order.as_ref(), 0) as i32)
    .bind(now.format("%Y-%m-%d").to_string())
    .bind(now)
    .fetch_one(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to create testimonial"))?;

    tracing::info!(testimonial_id = %id, "testimonial created");
    Ok(HttpResponse::Ok().json(created))
}

/// `PUT /api/testimonials/{id}` (admin) — returns the updated row.
#[tracing::instrument(skip(admin, app_state, payload), fields(admin = %admin.username))]
pub async fn put_testimonial(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateTestimonial>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Testimonial")?;

    // Rating and display order follow the create defaults on every update.
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE testimonials SET updated_at = ");
    qb.push_bind(Utc::now());
    qb.push(", rating = ");
    qb.push_bind(coerce::int_or(payload.rating.as_ref(), 5) as i32);
    qb.push(", display_order = ");
    qb.push_bind(coerce::int_or(payload.display_order.as_ref(), 0) as i32);
    if let Some(name) = &payload.name {
        qb.push(", name = ");
        qb.push_bind(name);
    }
    if let Some(company) = &payload.company {
        qb.push(", company = ");
        qb.push_bind(company);
    }
    if let Some(position) = &payload.position {
        qb.push(", position = ");
        qb.push_bind(position);
    }
    if let Some(testimonial) = &payload.testimonial {
        qb.push(", testimonial = ");
        qb.push_bind(testimonial);
    }
    if let Some(featured) = payload.featured {
        qb.push(", featured = ");
        qb.push_bind(featured);
    }
    if let Some(active) = payload.active {
        qb.push(", active = ");
        qb.push_bind(active);
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING *");

    let updated = qb
        .build_query_as::<Testimonial>()
        .fetch_optional(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to update testimonial"))?
        .ok_or(ApiError::NotFound("Testimonial"))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// `DELETE /api/testimonials/{id}` (admin)
#[tracing::instrument(skip(admin, app_state), fields(admin = %admin.username))]
pub async fn delete_testimonial(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Testimonial")?;
    let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
        .bind(id)
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to delete testimonial"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Testimonial"));
    }
    tracing::info!(testimonial_id = %id, "testimonial deleted");
    Ok(HttpResponse::Ok()
        .json(serde_json::json!({ "message": "Testimonial deleted successfully" })))
}

/// `PUT /api/testimonials/{id}/featured` (admin)
#[tracing::instrument(skip(admin, app_state, payload), fields(admin = %admin.username))]
pub async fn put_testimonial_featured(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<FeaturedToggle>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Testimonial")?;
    let result = sqlx::query("UPDATE testimonials SET featured = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(payload.featured)
        .bind(Utc::now())
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to update testimonial featured status"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Testimonial"));
    }
    Ok(HttpResponse::Ok().json(
        serde_json::json!({ "message": "Testimonial featured status updated successfully" }),
    ))
}

/// `PUT /api/testimonials/{id}/active` (admin)
#[tracing::instrument(skip(admin, app_state, payload), fields(admin = %admin.username))]
pub async fn put_testimonial_active(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ActiveToggle>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Testimonial")?;
    let result = sqlx::query("UPDATE testimonials SET active = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(payload.active)
        .bind(Utc::now())
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to update testimonial active status"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Testimonial"));
    }
    Ok(HttpResponse::Ok().json(
        serde_json::json!({ "message": "Testimonial active status updated successfully" }),
    ))
}
