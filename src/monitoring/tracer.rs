/*!
 * Tracing Setup
 * Structured logging for the simulator using the tracing crate
 *
 * Environment variables:
 * - RUST_LOG: log level and per-target filters (default: info)
 * - OVERLAY_SIM_TRACE_JSON: JSON output instead of compact lines
 */

use tracing::{info, span, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

pub const TRACE_JSON_ENV: &str = "OVERLAY_SIM_TRACE_JSON";

/// Install the global subscriber. Returns false if one was already set.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = json_requested(std::env::var(TRACE_JSON_ENV).ok().as_deref());

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
    installed
}

fn json_requested(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

/// Root span for one simulation session
pub fn span_simulation(slots: usize, processes: usize) -> Span {
    span!(Level::INFO, "simulation", slots, processes)
}
