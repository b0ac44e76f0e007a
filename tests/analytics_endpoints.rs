//! Integration tests for the visitor tracking beacon and the analytics
//! dashboards.
//!
//! Tests are skipped when DATABASE_URL is not set.

use actix_web::{App, http::StatusCode, test, web};
use atelier_server::{AppState, auth_middleware, handlers};
use uuid::Uuid;

async fn test_state() -> Option<AppState> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    }
    Some(AppState::new().await.expect("failed to init app_state"))
}

fn auth_header(state: &AppState) -> (&'static str, String) {
    let (token, _) = auth_middleware::issue_admin_token(&state.admin_username, &state.jwt_secret)
        .expect("token signing");
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! analytics_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(handlers::configure_analytics_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn repeat_hits_keep_the_same_visitor() {
    let Some(state) = test_state().await else { return };
    let app = analytics_app!(state);
    let device_id = format!("device-{}", Uuid::new_v4().simple());

    let req = test::TestRequest::post()
        .uri("/analytics/track-visitor")
        .set_json(serde_json::json!({
            "path": "/pricing",
            "deviceId": device_id,
            "browser": "Firefox",
        }))
        .to_request();
    let first: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first["success"], true);
    let unique_id = first["uniqueVisitorId"].as_str().unwrap().to_string();
    assert!(unique_id.ends_with(&device_id));

    let req = test::TestRequest::post()
        .uri("/analytics/track-visitor")
        .set_json(serde_json::json!({ "path": "/contact", "deviceId": device_id }))
        .to_request();
    let second: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(second["uniqueVisitorId"], unique_id.as_str());
    assert_eq!(second["visitorId"], first["visitorId"]);
    assert_eq!(second["isNewDevice"], false);
}

#[actix_web::test]
async fn page_time_update_is_best_effort() {
    let Some(state) = test_state().await else { return };
    let app = analytics_app!(state);
    let device_id = format!("device-{}", Uuid::new_v4().simple());

    let req = test::TestRequest::post()
        .uri("/analytics/track-visitor")
        .set_json(serde_json::json!({ "path": "/blog", "deviceId": device_id }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let visitor_id = body["visitorId"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri("/analytics/update-page-time")
        .set_json(serde_json::json!({
            "visitorId": visitor_id,
            "path": "/blog",
            "timeOnPage": 42,
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);

    // unknown and malformed visitor ids are still a success, nothing to update
    for bogus in [Uuid::new_v4().to_string(), "no-such-visitor".to_string()] {
        let req = test::TestRequest::put()
            .uri("/analytics/update-page-time")
            .set_json(serde_json::json!({
                "visitorId": bogus,
                "path": "/blog",
                "timeOnPage": 10,
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
    }
}

#[actix_web::test]
async fn overview_reports_counts_and_bounce_rate() {
    let Some(state) = test_state().await else { return };
    let auth = auth_header(&state);
    let app = analytics_app!(state);

    // make sure the window is not empty
    let req = test::TestRequest::post()
        .uri("/analytics/track-visitor")
        .set_json(serde_json::json!({
            "path": "/",
            "deviceId": format!("device-{}", Uuid::new_v4().simple()),
        }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/analytics/overview?timeRange=7d")
        .insert_header(auth)
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["totalVisitors"].as_i64().unwrap() >= 1);
    assert!(body["newVisitors"].as_i64().unwrap() >= 0);
    assert!(body["activeNow"].as_i64().unwrap() >= 1);
    assert!(body["bounceRate"].as_str().unwrap().ends_with('%'));
}

#[actix_web::test]
async fn dashboard_reads_require_admin() {
    let Some(state) = test_state().await else { return };
    let app = analytics_app!(state);

    for uri in [
        "/analytics/overview",
        "/analytics/visitor-distribution",
        "/analytics/recent-visitors",
        "/analytics/top-pages",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "expected 401 for {uri}");
    }
}

#[actix_web::test]
async fn distribution_and_top_pages_shape() {
    let Some(state) = test_state().await else { return };
    let auth = auth_header(&state);
    let app = analytics_app!(state);

    let req = test::TestRequest::post()
        .uri("/analytics/track-visitor")
        .set_json(serde_json::json!({
            "path": "/portfolio",
            "deviceId": format!("device-{}", Uuid::new_v4().simple()),
        }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/analytics/visitor-distribution")
        .insert_header(auth.clone())
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let countries = body.as_array().unwrap();
    assert!(!countries.is_empty());
    assert!(countries.len() <= 10);
    for entry in countries {
        assert!(entry["name"].is_string());
        assert!(entry["value"].as_i64().unwrap() >= 1);
        assert!(entry["flag"].is_string());
        assert!(entry["color"].as_str().unwrap().starts_with('#'));
        assert!(entry["percentage"].as_i64().unwrap() <= 100);
    }

    let req = test::TestRequest::get()
        .uri("/analytics/top-pages")
        .insert_header(auth.clone())
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let pages = body.as_array().unwrap();
    assert!(!pages.is_empty());
    assert_eq!(pages[0]["id"], 1);
    assert!(pages[0]["avgTime"].as_str().unwrap().contains('m'));
    assert!(pages[0]["bounceRate"].as_str().unwrap().ends_with('%'));

    let req = test::TestRequest::get()
        .uri("/analytics/recent-visitors")
        .insert_header(auth.clone())
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let recent = body.as_array().unwrap();
    assert!(!recent.is_empty());
    assert!(recent.len() <= 10);
    assert!(recent[0]["ip"].is_string());
    assert!(recent[0]["pages"].as_i64().unwrap() >= 1);

    let req = test::TestRequest::get()
        .uri("/analytics/recent-visitors?limit=1")
        .insert_header(auth)
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn analytics_routes_are_mounted_at_the_root() {
    let Some(state) = test_state().await else { return };
    let app = analytics_app!(state);
    let payload = serde_json::json!({
        "path": "/",
        "deviceId": format!("device-{}", Uuid::new_v4().simple()),
    });

    let req = test::TestRequest::post()
        .uri("/analytics/track-visitor")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/analytics/track-visitor")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
