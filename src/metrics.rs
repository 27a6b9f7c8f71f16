//! RPC Metrics
//!
//! Optional Prometheus instrumentation for plugin calls. Metrics are
//! registered into a caller-supplied [`Registry`] so the library never
//! touches the process-global default registry.

use crate::error::{Error, Result};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::time::Duration;

/// Per-method call counters and latency histogram
#[derive(Debug, Clone)]
pub struct RpcMetrics {
    /// Calls issued, by method
    calls: IntCounterVec,
    /// Failed calls, by method and fault class
    faults: IntCounterVec,
    /// Call latency in seconds, by method
    duration: HistogramVec,
}

impl RpcMetrics {
    /// Create the metric families and register them into `registry`
    pub fn register(registry: &Registry) -> Result<Self> {
        let calls = IntCounterVec::new(
            Opts::new("storage_mgmt_rpc_calls_total", "Plugin RPC calls issued"),
            &["method"],
        )
        .map_err(prom_error)?;
        let faults = IntCounterVec::new(
            Opts::new("storage_mgmt_rpc_faults_total", "Plugin RPC calls that failed"),
            &["method", "kind"],
        )
        .map_err(prom_error)?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "storage_mgmt_rpc_duration_seconds",
                "Plugin RPC round-trip latency",
            )
            .buckets(vec![0.001, 0.005, 0.025, 0.1, 0.5, 2.5, 10.0, 60.0]),
            &["method"],
        )
        .map_err(prom_error)?;

        registry.register(Box::new(calls.clone())).map_err(prom_error)?;
        registry.register(Box::new(faults.clone())).map_err(prom_error)?;
        registry.register(Box::new(duration.clone())).map_err(prom_error)?;

        Ok(Self {
            calls,
            faults,
            duration,
        })
    }

    /// Record one completed call; `fault` is the failure class, if any
    pub fn observe(&self, method: &str, elapsed: Duration, fault: Option<&str>) {
        self.calls.with_label_values(&[method]).inc();
        self.duration
            .with_label_values(&[method])
            .observe(elapsed.as_secs_f64());
        if let Some(kind) = fault {
            self.faults.with_label_values(&[method, kind]).inc();
        }
    }

    /// Calls issued for `method`
    pub fn calls(&self, method: &str) -> u64 {
        self.calls.with_label_values(&[method]).get()
    }

    /// Failures of class `kind` for `method`
    pub fn faults(&self, method: &str, kind: &str) -> u64 {
        self.faults.with_label_values(&[method, kind]).get()
    }
}

fn prom_error(e: prometheus::Error) -> Error {
    Error::Internal(format!("metrics registration failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_observe() {
        let registry = Registry::new();
        let metrics = RpcMetrics::register(&registry).unwrap();

        metrics.observe("pools", Duration::from_millis(3), None);
        metrics.observe("pools", Duration::from_millis(4), Some("communication"));

        assert_eq!(metrics.calls("pools"), 2);
        assert_eq!(metrics.faults("pools", "communication"), 1);
        assert_eq!(metrics.faults("pools", "timeout"), 0);
        assert_eq!(registry.gather().len(), 3);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        RpcMetrics::register(&registry).unwrap();
        assert_matches!(RpcMetrics::register(&registry), Err(Error::Internal(_)));
    }
}
