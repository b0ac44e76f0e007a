//! Library entry point for the atelier backend.
//!
//! Exports all core modules for use in integration tests and by the main binary.

pub mod auth_middleware;
pub mod coerce;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ipgen;
pub mod models;
pub mod pagination;
pub mod seed;
pub mod telemetry;

pub use db::*;
pub use models::AppState;
pub use seed::seed_sample_data;
pub use telemetry::{get_subscriber, init_subscriber};
