//! Structured logging setup for the atelier backend.
//!
//! Builds a layered `tracing` subscriber that emits Bunyan-formatted JSON to
//! the given sink and bridges `log` records into `tracing`. Request-level
//! spans are added separately via `tracing_actix_web::TracingLogger`.

use tracing::Subscriber;
use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

/// Composes the subscriber: env-filter, JSON span storage, and the Bunyan
/// formatting layer writing to `sink`.
///
/// `env_filter` is the fallback directive when `RUST_LOG` is not set.
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));
    let formatting_layer = BunyanFormattingLayer::new(name, sink);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Registers the subscriber as the global default.
///
/// # Panics
/// Panics if called more than once per process.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) {
    LogTracer::init().expect("failed to set the log tracer");
    set_global_default(subscriber).expect("failed to set the tracing subscriber");
}
