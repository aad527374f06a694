//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,session=debug,subjuntivo_backend=debug,tower_http=info,axum=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Notes:
//! - We include targets in the output to disambiguate sources
//!   (`session` for round transitions, `score` for points and levels).
//! - Tower HTTP TraceLayer still adds per-request spans; WebSocket connections
//!   get their own span carrying a connection id.

use tracing_subscriber::EnvFilter;

/// Session transitions and service lifecycle at debug, everything else at info.
const DEFAULT_FILTER: &str = "info,session=debug,score=debug,subjuntivo_backend=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
        EnvFilter::new(DEFAULT_FILTER)
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The two builders have different types, so init in each arm.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            let _ = builder.json().try_init();
        }
        _ => {
            let _ = builder.try_init();
        }
    }
}
