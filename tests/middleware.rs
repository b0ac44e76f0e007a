//! Auth guard tests for the atelier backend.
//!
//! Exercises the admin extractor through real routes: missing, malformed,
//! expired, and non-admin tokens each get their own rejection code, and the
//! login endpoint issues tokens the guard accepts.
//!
//! Tests are skipped when DATABASE_URL is not set.

use actix_web::{App, http::StatusCode, test, web};
use atelier_server::{AppState, auth_middleware, handlers};
use chrono::Utc;

async fn test_state() -> Option<AppState> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    }
    Some(AppState::new().await.expect("failed to init app_state"))
}

#[actix_web::test]
async fn missing_token_is_rejected_with_code() {
    let Some(state) = test_state().await else { return };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure_testimonial_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/testimonials").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "NO_TOKEN");
}

#[actix_web::test]
async fn expired_token_is_rejected_with_code() {
    let Some(state) = test_state().await else { return };
    let now = Utc::now().timestamp();
    let claims = auth_middleware::AdminClaims {
        id: 1,
        username: state.admin_username.clone(),
        role: "admin".to_string(),
        iat: now - 200,
        exp: now - 100,
    };
    let token = auth_middleware::sign_claims(&claims, &state.jwt_secret).unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure_testimonial_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/testimonials")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "TOKEN_EXPIRED");
}

#[actix_web::test]
async fn non_admin_role_is_forbidden() {
    let Some(state) = test_state().await else { return };
    let now = Utc::now().timestamp();
    let claims = auth_middleware::AdminClaims {
        id: 1,
        username: "editor".to_string(),
        role: "editor".to_string(),
        iat: now,
        exp: now + 3600,
    };
    let token = auth_middleware::sign_claims(&claims, &state.jwt_secret).unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure_testimonial_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/testimonials")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INSUFFICIENT_PRIVILEGES");
}

#[actix_web::test]
async fn login_issues_a_token_the_guard_accepts() {
    let Some(state) = test_state().await else { return };
    let credentials = serde_json::json!({
        "username": state.admin_username,
        "password": state.admin_password,
    });

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure_public_routes)
            .configure(handlers::configure_testimonial_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&credentials)
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["expiresIn"], "24h");
    assert_eq!(body["user"]["role"], "admin");
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/testimonials")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn wrong_credentials_are_rejected() {
    let Some(state) = test_state().await else { return };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure_public_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({ "username": "admin", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}
