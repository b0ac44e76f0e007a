//! Integration tests for the public content endpoints.
//!
//! Rows created by other tests or by the startup seed may be present, so
//! every assertion scopes itself with unique values (random emails, a random
//! category) rather than global counts.
//!
//! Tests are skipped when DATABASE_URL is not set.

use actix_web::{App, http::StatusCode, test, web};
use atelier_server::{AppState, handlers};
use uuid::Uuid;

async fn test_state() -> Option<AppState> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    }
    Some(AppState::new().await.expect("failed to init app_state"))
}

macro_rules! public_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(handlers::configure_public_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn health_check_reports_ok() {
    let Some(state) = test_state().await else { return };
    let app = public_app!(state);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn duplicate_user_email_conflicts() {
    let Some(state) = test_state().await else { return };
    let app = public_app!(state);
    let email = format!("user-{}@example.com", Uuid::new_v4().simple());
    let payload = serde_json::json!({ "email": email, "name": "Test User" });

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(&payload)
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["acknowledged"], true);
    assert!(body["insertedId"].is_string());

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "User already exists");
}

#[actix_web::test]
async fn invalid_user_email_is_rejected() {
    let Some(state) = test_state().await else { return };
    let app = public_app!(state);

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(serde_json::json!({ "email": "not-an-email" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn project_listing_paginates_within_a_category() {
    let Some(state) = test_state().await else { return };
    let app = public_app!(state);
    let category = format!("cat-{}", Uuid::new_v4().simple());

    for i in 0..3 {
        let req = test::TestRequest::post()
            .uri("/projects")
            .set_json(serde_json::json!({
                "title": format!("Project {i}"),
                "category": category,
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["acknowledged"], true);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/projects?category={category}&page=2&limit=1"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 1);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["projects"].as_array().unwrap().len(), 1);
    // new projects default to active
    assert_eq!(body["projects"][0]["isActive"], true);
}

#[actix_web::test]
async fn project_update_and_delete_round_trip() {
    let Some(state) = test_state().await else { return };
    let app = public_app!(state);

    let req = test::TestRequest::post()
        .uri("/projects")
        .set_json(serde_json::json!({ "title": "Original title" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = body["insertedId"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/projects/{id}"))
        .set_json(serde_json::json!({ "title": "Renamed", "isActive": false }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matchedCount"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/projects/{id}"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["isActive"], false);

    let req = test::TestRequest::delete()
        .uri(&format!("/projects/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/projects/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn malformed_project_id_is_not_found() {
    let Some(state) = test_state().await else { return };
    let app = public_app!(state);

    let req = test::TestRequest::get()
        .uri("/projects/not-a-uuid")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Project not found");
}

#[actix_web::test]
async fn blog_publish_flag_and_view_counter() {
    let Some(state) = test_state().await else { return };
    let app = public_app!(state);

    let req = test::TestRequest::post()
        .uri("/blogs")
        .set_json(serde_json::json!({
            "title": "Launch notes",
            "publishImmediately": true,
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = body["insertedId"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri(&format!("/blogs/{id}")).to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "Published");
    assert_eq!(body["views"], 0);

    for _ in 0..2 {
        let req = test::TestRequest::put()
            .uri(&format!("/blogs/{id}/views"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri(&format!("/blogs/{id}")).to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["views"], 2);

    // flipping the flag off demotes the post to draft
    let req = test::TestRequest::put()
        .uri(&format!("/blogs/{id}"))
        .set_json(serde_json::json!({ "publishImmediately": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri(&format!("/blogs/{id}")).to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "Draft");
}

#[actix_web::test]
async fn team_member_crud_round_trip() {
    let Some(state) = test_state().await else { return };
    let app = public_app!(state);

    let req = test::TestRequest::post()
        .uri("/team-members")
        .set_json(serde_json::json!({
            "name": "Ada Lovelace",
            "position": "Engineer",
            "expertise": ["rust", "sql"],
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = body["insertedId"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/team-members/{id}"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Ada Lovelace");
    assert_eq!(body["isActive"], true);
    assert_eq!(body["expertise"], serde_json::json!(["rust", "sql"]));

    let req = test::TestRequest::put()
        .uri(&format!("/team-members/{id}"))
        .set_json(serde_json::json!({ "isActive": false, "displayOrder": 7 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/team-members/{id}"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["isActive"], false);
    assert_eq!(body["displayOrder"], 7);

    let req = test::TestRequest::delete()
        .uri(&format!("/team-members/{id}"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Team member deleted successfully");
}

#[actix_web::test]
async fn service_creation_is_acknowledged() {
    let Some(state) = test_state().await else { return };
    let app = public_app!(state);

    let req = test::TestRequest::post()
        .uri("/services")
        .set_json(serde_json::json!({
            "title": "Web Development",
            "features": ["Responsive design", "SEO"],
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["acknowledged"], true);

    let req = test::TestRequest::get().uri("/services").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(body.as_array().unwrap().iter().any(|s| s["title"] == "Web Development"));
}
