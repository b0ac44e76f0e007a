//! HTTP handlers, grouped per resource.
//!
//! Each group exposes a `configure_*` function so the application and the
//! integration tests register the exact same route table.
//!
//! Route order matters inside a scope: literal segments such as `stats` and
//! `email-webhook` are registered before their `/{id}` siblings.

use actix_web::web;

pub mod analytics;
pub mod auth;
pub mod blogs;
pub mod contacts;
pub mod health;
pub mod media;
pub mod projects;
pub mod services;
pub mod team_members;
pub mod testimonials;
pub mod users;

/// Root banner, health check, login, and the public content resources.
pub fn configure_public_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::root_banner))
        .route("/api/health", web::get().to(health::health_check))
        .route("/api/auth/login", web::post().to(auth::login))
        .route("/users", web::get().to(users::get_users))
        .route("/users", web::post().to(users::post_user))
        .route("/services", web::get().to(services::get_services))
        .route("/services", web::post().to(services::post_service))
        .route("/testimonials", web::get().to(testimonials::get_testimonials_public))
        .route("/projects", web::get().to(projects::get_projects))
        .route("/projects", web::post().to(projects::post_project))
        .route("/projects/{id}", web::get().to(projects::get_project))
        .route("/projects/{id}", web::put().to(projects::put_project))
        .route("/projects/{id}", web::delete().to(projects::delete_project))
        .route("/blogs", web::get().to(blogs::get_blogs))
        .route("/blogs", web::post().to(blogs::post_blog))
        .route("/blogs/{id}", web::get().to(blogs::get_blog))
        .route("/blogs/{id}", web::put().to(blogs::put_blog))
        .route("/blogs/{id}", web::delete().to(blogs::delete_blog))
        .route("/blogs/{id}/views", web::put().to(blogs::increment_blog_views))
        .route("/team-members", web::get().to(team_members::get_team_members))
        .route("/team-members", web::post().to(team_members::post_team_member))
        .route("/team-members/{id}", web::get().to(team_members::get_team_member))
        .route("/team-members/{id}", web::put().to(team_members::put_team_member))
        .route(
            "/team-members/{id}",
            web::delete().to(team_members::delete_team_member),
        );
}

/// Admin testimonial management under `/api/testimonials`.
pub fn configure_testimonial_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/testimonials")
            .route("", web::get().to(testimonials::get_testimonials_admin))
            .route("", web::post().to(testimonials::post_testimonial))
            .route("/{id}", web::get().to(testimonials::get_testimonial))
            .route("/{id}", web::put().to(testimonials::put_testimonial))
            .route("/{id}", web::delete().to(testimonials::delete_testimonial))
            .route(
                "/{id}/featured",
                web::put().to(testimonials::put_testimonial_featured),
            )
            .route(
                "/{id}/active",
                web::put().to(testimonials::put_testimonial_active),
            ),
    );
}

/// Contact inbox under `/api/contacts`, including the reply tracker and the
/// inbound email webhook.
pub fn configure_contact_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/contacts")
            .route("", web::get().to(contacts::get_contacts))
            .route("", web::post().to(contacts::post_contact))
            .route("/stats", web::get().to(contacts::get_contact_stats))
            .route("/email-webhook", web::post().to(contacts::post_email_webhook))
            .route("/{id}", web::get().to(contacts::get_contact))
            .route("/{id}", web::delete().to(contacts::delete_contact))
            .route("/{id}/status", web::put().to(contacts::put_contact_status))
            .route("/{id}/reply", web::post().to(contacts::post_contact_reply))
            .route("/{id}/replies", web::get().to(contacts::get_contact_replies)),
    );
}

/// Media library under `/api/media`.
pub fn configure_media_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/media")
            .route("", web::get().to(media::get_media_list))
            .route("", web::post().to(media::post_media))
            .route("", web::delete().to(media::delete_media_bulk))
            .route("/test", web::get().to(media::get_media_test))
            .route("/{id}", web::get().to(media::get_media_item))
            .route("/{id}", web::put().to(media::put_media))
            .route("/{id}", web::delete().to(media::delete_media)),
    );
}

/// Visitor analytics under `/analytics`. Tracking endpoints are public;
/// the dashboard reads require an admin token.
pub fn configure_analytics_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/analytics")
            .route("/overview", web::get().to(analytics::get_overview))
            .route(
                "/visitor-distribution",
                web::get().to(analytics::get_visitor_distribution),
            )
            .route(
                "/recent-visitors",
                web::get().to(analytics::get_recent_visitors),
            )
            .route("/top-pages", web::get().to(analytics::get_top_pages))
            .route("/track-visitor", web::post().to(analytics::post_track_visitor))
            .route(
                "/update-page-time",
                web::put().to(analytics::put_update_page_time),
            ),
    );
}

/// Registers every route group; the full application surface.
pub fn configure_all_routes(cfg: &mut web::ServiceConfig) {
    configure_public_routes(cfg);
    configure_testimonial_routes(cfg);
    configure_contact_routes(cfg);
    configure_media_routes(cfg);
    configure_analytics_routes(cfg);
}
