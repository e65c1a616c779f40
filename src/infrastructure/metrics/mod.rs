//! Prometheus Metrics Module
//!
//! Application-wide metrics collection.
//!
//! # Metrics Collected
//! - Active WebSocket connection gauge
//! - Broadcast fan-out counters
//! - Persisted message counters

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Active WebSocket connections gauge
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "websocket_connections_active",
            "Number of live WebSocket connections registered with the hub",
        )
        .namespace("forum_chat"),
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Broadcast counter - one increment per hub broadcast request
pub static MESSAGES_BROADCAST_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "messages_broadcast_total",
            "Total number of messages fanned out by the hub",
        )
        .namespace("forum_chat"),
    )
    .expect("Failed to create MESSAGES_BROADCAST_TOTAL metric")
});

/// Persisted message counter
pub static MESSAGES_PERSISTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "messages_persisted_total",
            "Total number of chat messages durably stored",
        )
        .namespace("forum_chat"),
    )
    .expect("Failed to create MESSAGES_PERSISTED_TOTAL metric")
});

/// Connections pruned after a failed delivery
pub static CONNECTIONS_PRUNED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "connections_pruned_total",
            "Connections removed by the hub after a failed delivery",
        )
        .namespace("forum_chat"),
    )
    .expect("Failed to create CONNECTIONS_PRUNED_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(MESSAGES_BROADCAST_TOTAL.clone()))
        .expect("Failed to register MESSAGES_BROADCAST_TOTAL");
    registry
        .register(Box::new(MESSAGES_PERSISTED_TOTAL.clone()))
        .expect("Failed to register MESSAGES_PERSISTED_TOTAL");
    registry
        .register(Box::new(CONNECTIONS_PRUNED_TOTAL.clone()))
        .expect("Failed to register CONNECTIONS_PRUNED_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Force lazy initialization
        let _ = &*REGISTRY;
        let _ = &*WEBSOCKET_CONNECTIONS_ACTIVE;
        let _ = &*MESSAGES_BROADCAST_TOTAL;
        let _ = &*MESSAGES_PERSISTED_TOTAL;
        let _ = &*CONNECTIONS_PRUNED_TOTAL;
    }

    #[test]
    fn test_gather_metrics() {
        MESSAGES_BROADCAST_TOTAL.inc();
        let metrics = gather_metrics();
        assert!(metrics.contains("messages_broadcast_total"));
    }
}
