//! Tracing subscriber initialization.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` controls filtering;
/// the default keeps the service at info and quiets sqlx query logging.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
