//! Prometheus metrics for dispatched commands.
//!
//! - `sldispatch_command_total{command}` - Invocations that reached a handler
//! - `sldispatch_command_errors{command,kind}` - Handler failures by error code
//! - `sldispatch_command_duration_seconds{command}` - Handler latency
//! - `sldispatch_command_cancelled_total{command}` - Invocations stopped by a filter

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Commands executed, by key.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command failures by key and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Command latency by key.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Invocations cancelled before reaching the handler.
pub static COMMAND_CANCELLED: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before any metrics are recorded. Later calls are
/// no-ops.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(_) if $metric.get().is_some() => {}
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("sldispatch_command_total", "Commands executed by key"), &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("sldispatch_command_errors", "Command failures by key and error code"), &["command", "kind"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("sldispatch_command_duration_seconds", "Command latency by key")
            .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        &["command"]));
    register!(COMMAND_CANCELLED, IntCounterVec::new(Opts::new("sldispatch_command_cancelled_total", "Commands cancelled by a filter"), &["command"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, kind: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, kind]).inc();
    }
}

/// Record an invocation a filter cancelled.
#[inline]
pub fn record_cancelled(command: &str) {
    if let Some(c) = COMMAND_CANCELLED.get() {
        c.with_label_values(&[command]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        init();

        record_command("METRICS_TEST", 0.001);
        record_command_error("METRICS_TEST", "invalid_input");
        record_cancelled("METRICS_TEST");

        let output = gather_text();
        assert!(output.contains("sldispatch_command_total{command=\"METRICS_TEST\"} 1"));
        assert!(output.contains(
            "sldispatch_command_errors{command=\"METRICS_TEST\",kind=\"invalid_input\"} 1"
        ));
        assert!(output.contains("sldispatch_command_cancelled_total{command=\"METRICS_TEST\"} 1"));
        assert!(output.contains("sldispatch_command_duration_seconds_bucket"));
    }
}
