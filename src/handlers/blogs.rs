//! Blog post endpoints.
//!
//! The write contract takes a `publishImmediately` boolean and derives the
//! persisted `status` (Published/Draft) from it; the flag itself never
//! reaches the store. View counts are bumped by a dedicated endpoint using
//! an atomic increment.

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
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct BlogListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlog {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub publish_immediately: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlog {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub publish_immediately: Option<bool>,
}

fn status_for(publish_immediately: bool) -> &'static str {
    if publish_immediately { "Published" } else { "Draft" }
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &BlogListQuery) {
    let mut clause = SqlWhere::new();
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        push_search(
            qb,
            &mut clause,
            search,
            &["title", "excerpt", "author", "category"],
        );
    }
    if let Some(status) = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "All Status")
    {
        clause.prefix(qb);
        qb.push("status = ");
        qb.push_bind(status.to_string());
    }
}

/// `GET /blogs`
#[tracing::instrument(skip(app_state, query))]
pub async fn get_blogs(
    app_state: web::Data<AppState>,
    query: web::Query<BlogListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (page, limit, offset) = page_window(query.page, query.limit, 10);

    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM blogs");
    apply_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch blogs"))?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM blogs");
    apply_filters(&mut qb, &query);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    let blogs = qb
        .build_query_as::<Blog>()
        .fetch_all(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch blogs"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "blogs": blogs,
        "total": total,
        "page": page,
        "limit": limit,
        "totalPages": total_pages(total, limit),
    })))
}

/// `GET /blogs/{id}`
#[tracing::instrument(skip(app_state))]
pub async fn get_blog(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Blog post")?;
    let blog = sqlx::query_as::<_, Blog>("SELECT * FROM blogs WHERE id = $1")
        .bind(id)
        .fetch_optional(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch blog post"))?
        .ok_or(ApiError::NotFound("Blog post"))?;
    Ok(HttpResponse::Ok().json(blog))
}

/// `POST /blogs`
#[tracing::instrument(skip(app_state, payload), fields(title = %payload.title))]
pub async fn post_blog(
    app_state: web::Data<AppState>,
    payload: web::Json<CreateBlog>,
) -> Result<HttpResponse, ApiError> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO blogs
           (id, title, excerpt, content, author, category, image_url, status, views, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $9)"#,
    )
    .bind(id)
    .bind(&payload.title)
    .bind(&payload.excerpt)
    .bind(&payload.content)
    .bind(&payload.author)
    .bind(&payload.category)
    .bind(&payload.image_url)
    .bind(status_for(payload.publish_immediately))
    .bind(now)
    .execute(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to create blog post"))?;

    tracing::info!(blog_id = %id, published = payload.publish_immediately, "blog post created");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "acknowledged": true, "insertedId": id })))
}

/// `PUT /blogs/{id}`
#[tracing::instrument(skip(app_state, payload))]
pub async fn put_blog(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateBlog>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Blog post")?;

    let mut qb = QueryBuilder::<Postgres>::new("UPDATE blogs SET updated_at = ");
    qb.push_bind(Utc::now());
    if let Some(title) = &payload.title {
        qb.push(", title = ");
        qb.push_bind(title);
    }
    if let Some(excerpt) = &payload.excerpt {
        qb.push(", excerpt = ");
        qb.push_bind(excerpt);
    }
    if let Some(content) = &payload.content {
        qb.push(", content = ");
        qb.push_bind(content);
    }
    if let Some(author) = &payload.author {
        qb.push(", author = ");
        qb.push_bind(author);
    }
    if let Some(category) = &payload.category {
        qb.push(", category = ");
        qb.push_bind(category);
    }
    if let Some(image_url) = &payload.image_url {
        qb.push(", image_url = ");
        qb.push_bind(image_url);
    }
    if let Some(publish_immediately) = payload.publish_immediately {
        qb.push(", status = ");
        qb.push_bind(status_for(publish_immediately));
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);

    let result = qb
        .build()
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to update blog post"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Blog post"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "acknowledged": true,
        "matchedCount": 1,
        "modifiedCount": 1,
    })))
}

/// `DELETE /blogs/{id}`
#[tracing::instrument(skip(app_state))]
pub async fn delete_blog(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Blog post")?;
    let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
        .bind(id)
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to delete blog post"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Blog post"));
    }
    tracing::info!(blog_id = %id, "blog post deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Blog post deleted successfully" })))
}

/// `PUT /blogs/{id}/views` — atomic view counter increment.
#[tracing::instrument(skip(app_state))]
pub async fn increment_blog_views(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Blog post")?;
    let result = sqlx::query("UPDATE blogs SET views = views + 1 WHERE id = $1")
        .bind(id)
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to update blog views"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Blog post"));
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Views updated successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derives_from_publish_flag() {
        assert_eq!(status_for(true), "Published");
        assert_eq!(status_for(false), "Draft");
    }
}
