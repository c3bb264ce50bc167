//! Structured logging setup: an `EnvFilter` plus a JSON layer, with a fixed
//! filter for the process lifetime (no runtime-reload endpoint).
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Crates whose default verbosity is too noisy at `debug`; always pinned to
/// `info` regardless of the operator-supplied level.
const QUIET_LIBS: &[&str] = &["hyper", "hyper_util", "h2", "reqwest", "sqlx", "async_nats"];

pub fn init_tracing(log_level: &str) {
    let filter = QUIET_LIBS.iter().fold(
        EnvFilter::builder().with_default_directive(parse_level(log_level)).from_env_lossy(),
        |layer, lib| layer.add_directive(format!("{lib}=info").parse().expect("valid directive")),
    );

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .flatten_event(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    tracing::info!(log_level, "tracing initialized");
}

fn parse_level(log_level: &str) -> tracing::metadata::LevelFilter {
    log_level.parse().unwrap_or(tracing::metadata::LevelFilter::INFO)
}
