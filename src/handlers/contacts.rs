//! Contact message endpoints and the reply tracker.
//!
//! Contacts arrive from the public form with status "new". Admin actions
//! move them through read/replied/spam; `read_at` is only set on the first
//! transition into "read" while `replied_at` refreshes on every reply.
//!
//! Replies are an append-only side collection linked by contact id. Each
//! outgoing reply carries a tracking identifier that is embedded in the
//! outgoing email subject; the inbound webhook correlates answers back to
//! their contact by parsing that identifier out of the subject line.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth_middleware::AdminUser,
    error::{ApiError, parse_id},
    pagination::{SqlWhere, page_window, push_search, total_pages},
};

const CONTACT_STATUSES: [&str; 4] = ["new", "read", "replied", "spam"];
const DEFAULT_ADMIN_EMAIL: &str = "admin@atelierweb.dev";

/// Subject-line pattern linking an inbound email to its contact:
/// `[TRACK_<32 hex chars>_<millis>]`.
static TRACKING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[TRACK_([0-9a-f]+)_(\d+)\]").expect("valid tracking pattern"));

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub read_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
    pub last_reply: Option<serde_json::Value>,
    pub last_email_reply: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub admin_email: Option<String>,
    pub message: Option<String>,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub original_subject: Option<String>,
    pub from_email: Option<String>,
    pub to_email: Option<String>,
    pub subject: Option<String>,
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    #[serde(rename = "references")]
    pub reference_ids: Option<String>,
    pub tracking_id: String,
    pub method: String,
    pub status: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateContact {
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub message: String,
    pub admin_email: Option<String>,
    pub tracking_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailWebhook {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
}

/// Reply payload echoed to the admin; the sender address stays server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyReceipt<'a> {
    contact_id: Uuid,
    reply_message: &'a str,
    sent_at: DateTime<Utc>,
    recipient_email: &'a str,
    recipient_name: &'a str,
    original_subject: Option<&'a str>,
    tracking_id: &'a str,
    method: &'a str,
    status: &'a str,
}

/// Extracts `(contact id, timestamp)` from an email subject, if present.
fn parse_tracking_subject(subject: &str) -> Option<(Uuid, String)> {
    let captures = TRACKING_RE.captures(subject)?;
    let id = Uuid::parse_str(&captures[1]).ok()?;
    Some((id, captures[2].to_string()))
}

fn new_tracking_id(contact_id: Uuid, at: DateTime<Utc>) -> String {
    format!("TRACK_{}_{}", contact_id.simple(), at.timestamp_millis())
}

async fn status_counts(pool: &PgPool) -> Result<serde_json::Value, sqlx::Error> {
    let row: (i64, i64, i64, i64, i64) = sqlx::query_as(
        r#"SELECT COUNT(*),
                  COUNT(*) FILTER (WHERE status = 'new'),
                  COUNT(*) FILTER (WHERE status = 'read'),
                  COUNT(*) FILTER (WHERE status = 'replied'),
                  COUNT(*) FILTER (WHERE status = 'spam')
           FROM contacts"#,
    )
    .fetch_one(pool)
    .await?;
    Ok(serde_json::json!({
        "total": row.0,
        "new": row.1,
        "read": row.2,
        "replied": row.3,
        "spam": row.4,
    }))
}

fn apply_filters(qb: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, query: &ContactListQuery) {
    let mut clause = SqlWhere::new();
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        push_search(
            qb,
            &mut clause,
            search,
            &["name", "email", "subject", "message"],
        );
    }
    if let Some(status) = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "all")
    {
        clause.prefix(qb);
        qb.push("status = ");
        qb.push_bind(status.to_string());
    }
}

/// `GET /api/contacts` (admin) — paginated listing plus status stats.
#[tracing::instrument(skip(admin, app_state, query), fields(admin = %admin.username))]
pub async fn get_contacts(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    query: web::Query<ContactListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (page, limit, offset) = page_window(query.page, query.limit, 10);

    let mut count_qb = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM contacts");
    apply_filters(&mut count_qb, &query);
    let total: i64 = count_qb
        .build_query_scalar()
        .fetch_one(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch contacts"))?;

    let mut qb = sqlx::QueryBuilder::new("SELECT * FROM contacts");
    apply_filters(&mut qb, &query);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    let contacts = qb
        .build_query_as::<Contact>()
        .fetch_all(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch contacts"))?;

    let stats = status_counts(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch contacts"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "contacts": contacts,
        "total": total,
        "page": page,
        "limit": limit,
        "totalPages": total_pages(total, limit),
        "stats": stats,
    })))
}

/// `GET /api/contacts/stats` (admin)
#[tracing::instrument(skip(admin, app_state), fields(admin = %admin.username))]
pub async fn get_contact_stats(
    admin: AdminUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let stats = status_counts(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to fetch contact stats"))?;
    Ok(HttpResponse::Ok().json(stats))
}

/// `GET /api/contacts/{id}` (admin)
#[tracing::instrument(skip(admin, app_state), fields(admin = %admin.username))]
pub async fn get_contact(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Contact")?;
    let contact = fetch_contact(app_state.db.as_ref(), id).await?;
    Ok(HttpResponse::Ok().json(contact))
}

async fn fetch_contact(pool: &PgPool, id: Uuid) -> Result<Contact, ApiError> {
    sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::db("Failed to fetch contact"))?
        .ok_or(ApiError::NotFound("Contact"))
}

/// `POST /api/contacts` — public contact form; returns the created row.
#[tracing::instrument(skip(app_state, payload))]
pub async fn post_contact(
    app_state: web::Data<AppState>,
    payload: web::Json<CreateContact>,
) -> Result<HttpResponse, ApiError> {
    payload
        .validate()
        .map_err(|_| ApiError::Validation("A valid email is required".to_string()))?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let created = sqlx::query_as::<_, Contact>(
        r#"INSERT INTO contacts (id, name, email, phone, subject, message, status, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, 'new', $7, $7)
           RETURNING *"#,
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.subject)
    .bind(&payload.message)
    .bind(now)
    .fetch_one(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to create contact"))?;

    tracing::info!(contact_id = %id, "contact message received");
    Ok(HttpResponse::Ok().json(created))
}

/// `PUT /api/contacts/{id}/status` (admin) — returns the updated row.
///
/// `read_at` is stamped only on the first transition into "read";
/// `replied_at` is stamped on every transition into "replied".
#[tracing::instrument(skip(admin, app_state, payload), fields(admin = %admin.username))]
pub async fn put_contact_status(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Contact")?;
    if !CONTACT_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::Validation("Invalid status".to_string()));
    }

    let now = Utc::now();
    let updated = sqlx::query_as::<_, Contact>(
        r#"UPDATE contacts SET
               status = $2,
               updated_at = $3,
               read_at = CASE WHEN $2 = 'read' AND read_at IS NULL THEN $3 ELSE read_at END,
               replied_at = CASE WHEN $2 = 'replied' THEN $3 ELSE replied_at END
           WHERE id = $1
           RETURNING *"#,
    )
    .bind(id)
    .bind(&payload.status)
    .bind(now)
    .fetch_optional(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to update contact status"))?
    .ok_or(ApiError::NotFound("Contact"))?;

    tracing::info!(contact_id = %id, status = %payload.status, "contact status updated");
    Ok(HttpResponse::Ok().json(updated))
}

/// `DELETE /api/contacts/{id}` (admin)
#[tracing::instrument(skip(admin, app_state), fields(admin = %admin.username))]
pub async fn delete_contact(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Contact")?;
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
        .bind(id)
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to delete contact"))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Contact"));
    }
    tracing::info!(contact_id = %id, "contact deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Contact deleted successfully" })))
}

/// `POST /api/contacts/{id}/reply` (admin) — records an outgoing reply and
/// marks the contact replied.
#[tracing::instrument(skip(admin, app_state, payload), fields(admin = %admin.username))]
pub async fn post_contact_reply(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ReplyRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Contact")?;
    let contact = fetch_contact(app_state.db.as_ref(), id).await?;

    let now = Utc::now();
    let admin_email = payload
        .admin_email
        .clone()
        .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string());
    // A client-supplied tracking id means the reply went through the admin's
    // own email client; otherwise this is an in-app quick reply.
    let method = if payload.tracking_id.is_some() {
        "email_client"
    } else {
        "quick_reply"
    };
    let tracking_id = payload
        .tracking_id
        .clone()
        .unwrap_or_else(|| new_tracking_id(id, now));

    sqlx::query(
        r#"INSERT INTO replies
           (id, contact_id, admin_email, message, recipient_email, recipient_name, original_subject,
            tracking_id, method, status, sent_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'sent', $10)"#,
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(&admin_email)
    .bind(&payload.message)
    .bind(&contact.email)
    .bind(&contact.name)
    .bind(&contact.subject)
    .bind(&tracking_id)
    .bind(method)
    .bind(now)
    .execute(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to track reply"))?;

    let last_reply = serde_json::json!({
        "message": payload.message,
        "sentAt": now,
        "adminEmail": admin_email,
        "trackingId": tracking_id,
        "method": method,
    });
    sqlx::query(
        r#"UPDATE contacts
           SET status = 'replied', replied_at = $2, last_reply = $3, updated_at = $2
           WHERE id = $1"#,
    )
    .bind(id)
    .bind(now)
    .bind(&last_reply)
    .execute(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to track reply"))?;

    tracing::info!(contact_id = %id, tracking_id = %tracking_id, "reply tracked");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Reply tracked successfully",
        "trackingId": tracking_id,
        "replyData": ReplyReceipt {
            contact_id: id,
            reply_message: &payload.message,
            sent_at: now,
            recipient_email: &contact.email,
            recipient_name: &contact.name,
            original_subject: contact.subject.as_deref(),
            tracking_id: &tracking_id,
            method,
            status: "sent",
        },
    })))
}

/// `GET /api/contacts/{id}/replies` (admin)
#[tracing::instrument(skip(admin, app_state), fields(admin = %admin.username))]
pub async fn get_contact_replies(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Contact")?;
    let replies = sqlx::query_as::<_, Reply>(
        r#"SELECT * FROM replies WHERE contact_id = $1
           ORDER BY sent_at DESC NULLS LAST, received_at DESC NULLS LAST"#,
    )
    .bind(id)
    .fetch_all(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to fetch replies"))?;
    Ok(HttpResponse::Ok().json(replies))
}

/// `POST /api/contacts/email-webhook` — ingests an inbound email reply.
///
/// The tracking identifier is parsed out of the subject line; without one
/// the webhook is rejected with a 400.
#[tracing::instrument(skip(app_state, payload))]
pub async fn post_email_webhook(
    app_state: web::Data<AppState>,
    payload: web::Json<EmailWebhook>,
) -> Result<HttpResponse, ApiError> {
    let Some((contact_id, timestamp)) = parse_tracking_subject(&payload.subject) else {
        tracing::warn!("email webhook without tracking id in subject");
        return Err(ApiError::Validation("No tracking ID found".to_string()));
    };

    let contact = fetch_contact(app_state.db.as_ref(), contact_id).await?;

    let now = Utc::now();
    let tracking_id = format!("TRACK_{}_{}", contact_id.simple(), timestamp);
    let message = payload.text.clone().or_else(|| payload.html.clone());

    sqlx::query(
        r#"INSERT INTO replies
           (id, contact_id, from_email, to_email, subject, message, message_id, in_reply_to,
            reference_ids, tracking_id, method, status, received_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'email_received', 'received', $11)"#,
    )
    .bind(Uuid::new_v4())
    .bind(contact_id)
    .bind(&payload.from)
    .bind(&payload.to)
    .bind(&payload.subject)
    .bind(&message)
    .bind(&payload.message_id)
    .bind(&payload.in_reply_to)
    .bind(&payload.references)
    .bind(&tracking_id)
    .bind(now)
    .execute(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to process email webhook"))?;

    let last_email_reply = serde_json::json!({
        "from": payload.from,
        "subject": payload.subject,
        "receivedAt": now,
        "messageId": payload.message_id,
    });
    sqlx::query(
        r#"UPDATE contacts
           SET status = 'replied', replied_at = $2, last_email_reply = $3, updated_at = $2
           WHERE id = $1"#,
    )
    .bind(contact.id)
    .bind(now)
    .bind(&last_email_reply)
    .execute(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to process email webhook"))?;

    tracing::info!(contact_id = %contact_id, "email reply processed");
    Ok(HttpResponse::Ok()
        .json(serde_json::json!({ "success": true, "message": "Email reply processed" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_id_matches_webhook_pattern() {
        let id = Uuid::new_v4();
        let tracking = new_tracking_id(id, Utc::now());
        let subject = format!("Re: your inquiry [{tracking}]");
        let (parsed, _) = parse_tracking_subject(&subject).expect("tracking id parses back");
        assert_eq!(parsed, id);
    }

    #[test]
    fn subject_without_tracking_id_is_rejected() {
        assert!(parse_tracking_subject("Re: hello there").is_none());
        assert!(parse_tracking_subject("[TRACK_zzzz_123]").is_none());
    }

    #[test]
    fn truncated_hex_does_not_parse_as_contact() {
        assert!(parse_tracking_subject("[TRACK_abc123_17000]").is_none());
    }
}
