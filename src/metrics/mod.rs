//! # Metrics
//!
//! Prometheus metrics for content generation and service connectivity,
//! rendered by `GET /metrics` on the dashboard API.
//!
//! **Counters:**
//! - `poster_generation_attempts_total{provider, outcome}` - One per provider attempt
//! - `poster_fallbacks_total{from, to}` - Fallback chain advances that ended in success
//! - `poster_service_transitions_total{service, state}` - Connection state changes
//!
//! **Histograms:**
//! - `poster_generation_duration_seconds{provider}` - Attempt latency

pub mod handler;

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const GENERATION_ATTEMPTS: &str = "poster_generation_attempts_total";
pub const FALLBACKS: &str = "poster_fallbacks_total";
pub const SERVICE_TRANSITIONS: &str = "poster_service_transitions_total";
pub const GENERATION_DURATION: &str = "poster_generation_duration_seconds";

/// Outcome label for a provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Failure => "failure",
        }
    }
}

pub fn record_attempt(provider: &'static str, outcome: AttemptOutcome, elapsed: Duration) {
    metrics::counter!(GENERATION_ATTEMPTS, "provider" => provider, "outcome" => outcome.as_str())
        .increment(1);
    metrics::histogram!(GENERATION_DURATION, "provider" => provider).record(elapsed.as_secs_f64());
}

pub fn record_fallback(from: &'static str, to: &'static str) {
    metrics::counter!(FALLBACKS, "from" => from, "to" => to).increment(1);
}

pub fn record_transition(service: &'static str, state: &'static str) {
    metrics::counter!(SERVICE_TRANSITIONS, "service" => service, "state" => state).increment(1);
}

/// Install the global Prometheus recorder.
///
/// Duration buckets follow LLM latency: [0.1, 0.25, 0.5, 1, 2.5, 5, 10, 30, 60] seconds.
pub fn setup_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let duration_buckets = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(GENERATION_DURATION.to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Handle for `GET /metrics`.
///
/// Installs the global recorder on first use. Later callers (tests, a second
/// router in the same process) get a detached handle that renders nothing.
pub fn prometheus_handle() -> PrometheusHandle {
    setup_metrics().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "metrics recorder already installed");
        PrometheusBuilder::new().build_recorder().handle()
    })
}
