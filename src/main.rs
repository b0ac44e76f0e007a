//! Main entry point for the atelier backend.
//!
//! Sets up the Actix Web server, registers the public content routes and the
//! admin API, and initializes shared application state (database pool, auth
//! configuration). Uses dotenv for config and launches the async runtime
//! with structured JSON tracing.

use actix_web::{App, HttpServer, middleware::Logger, web};
use atelier_server::{AppState, get_subscriber, handlers, init_subscriber, seed_sample_data};
use dotenv::dotenv;
use tracing_actix_web::TracingLogger;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let subscriber = get_subscriber("atelier".to_string(), "info".to_string(), std::io::stdout);
    init_subscriber(subscriber);

    let app_state = AppState::new().await.expect("failed to init app_state");

    if let Err(e) = seed_sample_data(app_state.db.as_ref()).await {
        tracing::error!(error = ?e, "failed to seed sample data");
    }

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(TracingLogger::default())
            .wrap(Logger::default())
            .configure(handlers::configure_all_routes)
    })
    .bind(("0.0.0.0", port))?
    .run();

    tracing::info!(port, "atelier backend listening");

    let srv_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Shutdown signal received");
            srv_handle.stop(true).await;
        }
        res = server_task => {
            if let Err(e) = res {
                tracing::error!("Server task failed: {}", e);
            }
        }
    }

    Ok(())
}
