//! Telemetry and Observability
//!
//! Structured logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set. `LOG_FORMAT=json` switches
/// to machine-readable output for log shippers; the default is a
/// human-readable format with source locations.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,forum_chat=debug,sqlx=warn,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }

    tracing::info!("Tracing initialized");
}
