//! Prometheus metrics collection for lobbyd.
//!
//! - `lobby_command_total{command}` - Commands processed by keyword
//! - `lobby_command_duration_seconds{command}` - Command latency histogram
//! - `lobby_command_errors_total{command,error}` - Failed commands by error code
//! - `lobby_flood_alerts_total{action}` - Flood threshold crossings
//!
//! Every helper is a no-op until [`init`] has run, so unit tests never
//! need a registry.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Lines and batches queued for clients.
pub static MESSAGES_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Ban lookups that failed in the store and were treated as "not banned".
pub static BAN_LOOKUP_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Commands processed by keyword.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command errors by keyword and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Flood threshold crossings by the action taken.
pub static FLOOD_ALERTS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Currently logged-in sessions.
pub static CONNECTED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

/// Open battles.
pub static ACTIVE_BATTLES: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Command processing latency by keyword.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
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

    register!(MESSAGES_SENT, IntCounter::new("lobby_messages_sent_total", "Lines and batches queued for clients"));
    register!(BAN_LOOKUP_FAILURES, IntCounter::new("lobby_ban_lookup_failures_total", "Ban lookups that failed and degraded to not-banned"));
    register!(CONNECTED_SESSIONS, IntGauge::new("lobby_connected_sessions", "Logged-in sessions"));
    register!(ACTIVE_BATTLES, IntGauge::new("lobby_active_battles", "Open battles"));

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("lobby_command_total", "Commands processed by keyword"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("lobby_command_duration_seconds", "Command latency by keyword")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("lobby_command_errors_total", "Command errors by keyword and error code"), &["command", "error"]));
    register!(FLOOD_ALERTS, IntCounterVec::new(Opts::new("lobby_flood_alerts_total", "Flood threshold crossings"), &["action"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
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

// ============================================================================
// Helper functions for metric updates
// ============================================================================

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
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, error]).inc();
    }
}

#[inline]
pub fn record_flood_alert(action: &str) {
    if let Some(c) = FLOOD_ALERTS.get() {
        c.with_label_values(&[action]).inc();
    }
}

#[inline]
pub fn record_message_sent() {
    if let Some(c) = MESSAGES_SENT.get() {
        c.inc();
    }
}

#[inline]
pub fn record_ban_lookup_failure() {
    if let Some(c) = BAN_LOOKUP_FAILURES.get() {
        c.inc();
    }
}

#[inline]
pub fn set_connected_sessions(count: usize) {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.set(count as i64);
    }
}

#[inline]
pub fn set_active_battles(count: usize) {
    if let Some(g) = ACTIVE_BATTLES.get() {
        g.set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_command("PING", 0.001);
        record_command_error("JOINBATTLE", "precondition");
        record_flood_alert("disconnect");
        set_active_battles(3);

        let output = gather_metrics();
        assert!(output.contains("lobby_command_total"));
        assert!(output.contains("lobby_flood_alerts_total"));
        assert!(output.contains("lobby_active_battles"));
    }
}
