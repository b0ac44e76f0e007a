//! Visitor analytics.
//!
//! Tracking is public: the site beacon posts page hits which are upserted
//! into a visitors table keyed by a composite `<ip>_<deviceId>` identifier,
//! plus an append-only page_views table. The admin dashboards read
//! aggregations over both.
//!
//! A visitor row created before the beacon learned its device id has a bare
//! ip identifier and a NULL device id; the next hit carrying a device id
//! backfills both so the visitor is not double counted.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth_middleware::AdminUser, error::ApiError, ipgen::IpGenerator};

const DISTRIBUTION_COLORS: [&str; 10] = [
    "#3B82F6", "#10B981", "#FBBF24", "#EF4444", "#8B5CF6", "#F59E0B", "#06B6D4", "#84CC16",
    "#F97316", "#EC4899",
];

const PAGE_COLORS: [&str; 5] = [
    "bg-yellow-400",
    "bg-blue-400",
    "bg-green-400",
    "bg-purple-400",
    "bg-red-400",
];

#[derive(Debug, sqlx::FromRow)]
pub struct Visitor {
    pub id: Uuid,
    pub unique_visitor_id: String,
    pub ip_address: String,
    pub device_id: Option<String>,
    pub user_agent: Option<String>,
    pub country: String,
    pub city: String,
    pub country_code: String,
    pub device: String,
    pub browser: String,
    pub is_new_visitor: bool,
    pub page_views: i64,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Query string shared by the dashboards; each one reads the fields it
/// needs and ignores the rest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub time_range: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisitor {
    pub ip_address: Option<String>,
    pub path: Option<String>,
    pub device_id: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub country_code: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTimeUpdate {
    pub visitor_id: Option<String>,
    pub path: Option<String>,
    pub time_on_page: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecentVisitor {
    id: Uuid,
    ip: String,
    country: String,
    city: String,
    device: String,
    browser: String,
    pages: i64,
    last_activity: DateTime<Utc>,
    unique_visitor_id: String,
    device_id: Option<String>,
}

/// Parses a dashboard range selector into its window start. Unknown values
/// fall back to the default seven day window.
fn range_start(range: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let days = match range {
        Some("1d") => 1,
        Some("30d") => 30,
        _ => 7,
    };
    now - Duration::days(days)
}

fn country_flag(country: &str) -> &'static str {
    match country {
        "Bangladesh" => "\u{1F1E7}\u{1F1E9}",
        "United States" => "\u{1F1FA}\u{1F1F8}",
        "Taiwan" => "\u{1F1F9}\u{1F1FC}",
        "India" => "\u{1F1EE}\u{1F1F3}",
        "United Kingdom" => "\u{1F1EC}\u{1F1E7}",
        "Canada" => "\u{1F1E8}\u{1F1E6}",
        "Germany" => "\u{1F1E9}\u{1F1EA}",
        "France" => "\u{1F1EB}\u{1F1F7}",
        "Japan" => "\u{1F1EF}\u{1F1F5}",
        "Australia" => "\u{1F1E6}\u{1F1FA}",
        _ => "\u{1F30D}",
    }
}

/// Formats an average dwell time in seconds as "Xm Ys".
fn format_avg_time(seconds: i64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// `GET /analytics/overview` (admin) — counts windowed on the visitor's
/// creation time; only "active now" looks at last activity.
#[tracing::instrument(skip(admin, app_state, query), fields(admin = %admin.username))]
pub async fn get_overview(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now();
    let start = range_start(query.time_range.as_deref(), now);
    let active_cutoff = now - Duration::minutes(5);

    let row: (i64, i64, i64, i64) = sqlx::query_as(
        r#"SELECT COUNT(*) FILTER (WHERE created_at >= $1),
                  COUNT(*) FILTER (WHERE is_new_visitor AND created_at >= $1),
                  COUNT(*) FILTER (WHERE last_activity >= $2),
                  COUNT(*) FILTER (WHERE created_at >= $1 AND page_views <= 1)
           FROM visitors"#,
    )
    .bind(start)
    .bind(active_cutoff)
    .fetch_one(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to fetch analytics overview"))?;

    let (total_visitors, new_visitors, active_now, bounces) = row;
    let bounce_rate = if total_visitors > 0 {
        format!("{:.1}%", bounces as f64 * 100.0 / total_visitors as f64)
    } else {
        "0%".to_string()
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "totalVisitors": total_visitors,
        "newVisitors": new_visitors,
        "activeNow": active_now,
        "bounceRate": bounce_rate,
    })))
}

/// `GET /analytics/visitor-distribution` (admin) — top ten countries among
/// visitors created in the window, with chart colors, flags, and
/// share-of-listed percentages.
#[tracing::instrument(skip(admin, app_state, query), fields(admin = %admin.username))]
pub async fn get_visitor_distribution(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, ApiError> {
    let start = range_start(query.time_range.as_deref(), Utc::now());

    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"SELECT country, COUNT(*)
           FROM visitors
           WHERE created_at >= $1
           GROUP BY country
           ORDER BY COUNT(*) DESC
           LIMIT 10"#,
    )
    .bind(start)
    .fetch_all(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to fetch visitor distribution"))?;

    let listed_total: i64 = rows.iter().map(|(_, n)| n).sum();
    let distribution: Vec<serde_json::Value> = rows
        .iter()
        .enumerate()
        .map(|(i, (country, count))| {
            let percentage = if listed_total > 0 {
                (*count as f64 * 100.0 / listed_total as f64).round() as i64
            } else {
                0
            };
            serde_json::json!({
                "name": country,
                "value": count,
                "flag": country_flag(country),
                "percentage": percentage,
                "color": DISTRIBUTION_COLORS[i % DISTRIBUTION_COLORS.len()],
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(distribution))
}

/// `GET /analytics/recent-visitors` (admin) — latest N by activity,
/// default ten.
#[tracing::instrument(skip(admin, app_state, query), fields(admin = %admin.username))]
pub async fn get_recent_visitors(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(10).max(1);
    let visitors = sqlx::query_as::<_, Visitor>(
        "SELECT * FROM visitors ORDER BY last_activity DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to fetch recent visitors"))?;

    let recent: Vec<RecentVisitor> = visitors
        .into_iter()
        .map(|v| RecentVisitor {
            id: v.id,
            ip: v.ip_address,
            country: v.country,
            city: v.city,
            device: v.device,
            browser: v.browser,
            pages: v.page_views,
            last_activity: v.last_activity,
            unique_visitor_id: v.unique_visitor_id,
            device_id: v.device_id,
        })
        .collect();

    Ok(HttpResponse::Ok().json(recent))
}

/// `GET /analytics/top-pages` (admin)
///
/// A bounce is a visitor whose entire activity in the window is a single
/// page view, attributed to the one page they saw.
#[tracing::instrument(skip(admin, app_state, query), fields(admin = %admin.username))]
pub async fn get_top_pages(
    admin: AdminUser,
    app_state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, ApiError> {
    let start = range_start(query.time_range.as_deref(), Utc::now());
    let limit = query.limit.unwrap_or(10).max(1);

    let rows: Vec<(String, i64, i64, f64, i64)> = sqlx::query_as(
        r#"WITH window_views AS (
               SELECT visitor_id, COUNT(*) AS total_views
               FROM page_views
               WHERE created_at >= $1
               GROUP BY visitor_id
           )
           SELECT pv.path,
                  COUNT(*),
                  COUNT(DISTINCT pv.visitor_id),
                  COALESCE(AVG(pv.time_on_page), 0)::float8,
                  COUNT(DISTINCT pv.visitor_id) FILTER (WHERE wv.total_views = 1)
           FROM page_views pv
           JOIN window_views wv ON wv.visitor_id = pv.visitor_id
           WHERE pv.created_at >= $1
           GROUP BY pv.path
           ORDER BY COUNT(*) DESC
           LIMIT $2"#,
    )
    .bind(start)
    .bind(limit)
    .fetch_all(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to fetch top pages"))?;

    let pages: Vec<serde_json::Value> = rows
        .iter()
        .enumerate()
        .map(|(i, (path, views, visitors, avg_time, bounces))| {
            let bounce_rate = if *visitors > 0 {
                (*bounces as f64 * 100.0 / *visitors as f64).round() as i64
            } else {
                0
            };
            serde_json::json!({
                "id": i + 1,
                "page": path,
                "views": views,
                "visitors": visitors,
                "avgTime": format_avg_time(*avg_time as i64),
                "bounceRate": format!("{bounce_rate}%"),
                "color": PAGE_COLORS[i % PAGE_COLORS.len()],
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(pages))
}

/// Resolves the beacon's source address. A body-supplied address wins;
/// otherwise, outside production the address is synthesized per session so
/// local dashboards show varied geography.
fn client_ip(req: &HttpRequest, payload: &TrackVisitor) -> String {
    if let Some(ip) = payload.ip_address.as_deref().filter(|ip| !ip.is_empty()) {
        return ip.to_string();
    }
    let production = std::env::var("APP_ENV").is_ok_and(|env| env == "production");
    if !production {
        let session_key = payload
            .device_id
            .clone()
            .unwrap_or_else(|| "anonymous".to_string());
        return IpGenerator::shared().session_ip(&session_key);
    }
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("0.0.0.0")
        .split(':')
        .next()
        .unwrap_or("0.0.0.0")
        .to_string()
}

/// `POST /analytics/track-visitor` — public page-hit beacon.
#[tracing::instrument(skip(app_state, req, payload))]
pub async fn post_track_visitor(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<TrackVisitor>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now();
    let ip = client_ip(&req, &payload);
    let unique_visitor_id = match payload.device_id.as_deref() {
        Some(device_id) => format!("{ip}_{device_id}"),
        None => ip.clone(),
    };
    let info = IpGenerator::shared().ip_info(&ip);
    let country = payload.country.clone().unwrap_or_else(|| info.country.to_string());
    let city = payload.city.clone().unwrap_or_else(|| info.city.to_string());
    let country_code = payload
        .country_code
        .clone()
        .unwrap_or_else(|| info.code.to_string());
    let device = payload.device.clone().unwrap_or_else(|| "Desktop".to_string());
    let browser = payload.browser.clone().unwrap_or_else(|| "Unknown".to_string());
    let path = payload.path.clone().unwrap_or_else(|| "/".to_string());
    let referrer = payload.referrer.clone().unwrap_or_default();

    // Ip-only rows predate the beacon learning its device id; match them so
    // the same visitor is not counted twice.
    let existing = sqlx::query_as::<_, Visitor>(
        r#"SELECT * FROM visitors
           WHERE unique_visitor_id = $1 OR (ip_address = $2 AND device_id IS NULL)
           LIMIT 1"#,
    )
    .bind(&unique_visitor_id)
    .bind(&ip)
    .fetch_optional(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to track visitor"))?;

    let (visitor_id, final_unique_id, is_new_device) = match existing {
        Some(visitor) => {
            let backfills_device =
                visitor.device_id.is_none() && payload.device_id.is_some();
            let final_unique_id = if backfills_device {
                unique_visitor_id.clone()
            } else {
                visitor.unique_visitor_id.clone()
            };
            sqlx::query(
                r#"UPDATE visitors SET
                       last_activity = $2,
                       is_new_visitor = FALSE,
                       page_views = page_views + 1,
                       device_id = COALESCE(device_id, $3),
                       unique_visitor_id = $4
                   WHERE id = $1"#,
            )
            .bind(visitor.id)
            .bind(now)
            .bind(&payload.device_id)
            .bind(&final_unique_id)
            .execute(app_state.db.as_ref())
            .await
            .map_err(ApiError::db("Failed to track visitor"))?;
            (visitor.id, final_unique_id, backfills_device)
        }
        None => {
            let id = Uuid::new_v4();
            sqlx::query(
                r#"INSERT INTO visitors
                   (id, unique_visitor_id, ip_address, device_id, user_agent, country, city,
                    country_code, device, browser, is_new_visitor, page_views, created_at, last_activity)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, 1, $11, $11)"#,
            )
            .bind(id)
            .bind(&unique_visitor_id)
            .bind(&ip)
            .bind(&payload.device_id)
            .bind(&payload.user_agent)
            .bind(&country)
            .bind(&city)
            .bind(&country_code)
            .bind(&device)
            .bind(&browser)
            .bind(now)
            .execute(app_state.db.as_ref())
            .await
            .map_err(ApiError::db("Failed to track visitor"))?;
            (id, unique_visitor_id.clone(), payload.device_id.is_some())
        }
    };

    sqlx::query(
        r#"INSERT INTO page_views (id, visitor_id, unique_visitor_id, path, referrer, time_on_page, created_at)
           VALUES ($1, $2, $3, $4, $5, 0, $6)"#,
    )
    .bind(Uuid::new_v4())
    .bind(visitor_id)
    .bind(&final_unique_id)
    .bind(&path)
    .bind(&referrer)
    .bind(now)
    .execute(app_state.db.as_ref())
    .await
    .map_err(ApiError::db("Failed to track visitor"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "visitorId": visitor_id,
        "uniqueVisitorId": final_unique_id,
        "isNewDevice": is_new_device,
    })))
}

/// `PUT /analytics/update-page-time` — backfills dwell time into the newest
/// zero-time view for the visitor and page. Best effort; a miss or an
/// unparseable visitor id is not an error since the beacon fires on unload.
#[tracing::instrument(skip(app_state, payload))]
pub async fn put_update_page_time(
    app_state: web::Data<AppState>,
    payload: web::Json<PageTimeUpdate>,
) -> Result<HttpResponse, ApiError> {
    let visitor_id = payload
        .visitor_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok());
    if let (Some(visitor_id), Some(path), Some(time_on_page)) =
        (visitor_id, payload.path.as_deref(), payload.time_on_page)
    {
        sqlx::query(
            r#"UPDATE page_views SET time_on_page = $3
               WHERE id = (
                   SELECT id FROM page_views
                   WHERE visitor_id = $1 AND path = $2 AND time_on_page = 0
                   ORDER BY created_at DESC
                   LIMIT 1
               )"#,
        )
        .bind(visitor_id)
        .bind(path)
        .bind(time_on_page.max(0))
        .execute(app_state.db.as_ref())
        .await
        .map_err(ApiError::db("Failed to update page time"))?;
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_selector_maps_to_window_start() {
        let now = Utc::now();
        assert_eq!(range_start(Some("1d"), now), now - Duration::days(1));
        assert_eq!(range_start(Some("7d"), now), now - Duration::days(7));
        assert_eq!(range_start(Some("30d"), now), now - Duration::days(30));
        assert_eq!(range_start(Some("90d"), now), now - Duration::days(7));
        assert_eq!(range_start(None, now), now - Duration::days(7));
    }

    #[test]
    fn avg_time_renders_minutes_and_seconds() {
        assert_eq!(format_avg_time(0), "0m 0s");
        assert_eq!(format_avg_time(59), "0m 59s");
        assert_eq!(format_avg_time(125), "2m 5s");
    }

    #[test]
    fn beacon_payloads_use_the_wire_field_names() {
        let hit: TrackVisitor = serde_json::from_value(serde_json::json!({
            "ipAddress": "103.112.54.9",
            "path": "/pricing",
            "deviceId": "dev-1",
            "countryCode": "BD",
        }))
        .unwrap();
        assert_eq!(hit.ip_address.as_deref(), Some("103.112.54.9"));
        assert_eq!(hit.path.as_deref(), Some("/pricing"));
        assert_eq!(hit.country_code.as_deref(), Some("BD"));

        let update: PageTimeUpdate = serde_json::from_value(serde_json::json!({
            "visitorId": Uuid::new_v4().to_string(),
            "path": "/pricing",
            "timeOnPage": 42,
        }))
        .unwrap();
        assert!(update.visitor_id.is_some());
        assert_eq!(update.path.as_deref(), Some("/pricing"));
        assert_eq!(update.time_on_page, Some(42));
    }

    #[test]
    fn unknown_countries_fall_back_to_globe() {
        assert_eq!(country_flag("Bangladesh"), "🇧🇩");
        assert_eq!(country_flag("Atlantis"), "🌍");
    }
}
