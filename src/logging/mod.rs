//! Logging infrastructure for odindex
//!
//! Tracing subscriber setup plus the per-request access log line.

use hyper::{Method, StatusCode};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Build the env filter: `RUST_LOG` wins, otherwise `odindex={level},info`
fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("odindex={},info", log_level).into())
}

/// Initialize the global tracing subscriber
pub fn init(log_level: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(log_level));
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

/// Emit the access log line for a finished request.
///
/// Server errors log at warn so they stand out in the default filter.
pub fn log_request(
    request_id: &str,
    method: &Method,
    path: &str,
    status: StatusCode,
    elapsed: Duration,
) {
    let latency_ms = elapsed.as_millis() as u64;
    if status.is_server_error() {
        warn!(
            request_id,
            method = %method,
            path,
            status = status.as_u16(),
            latency_ms,
            "request failed"
        );
    } else {
        info!(
            request_id,
            method = %method,
            path,
            status = status.as_u16(),
            latency_ms,
            "request"
        );
    }
}
