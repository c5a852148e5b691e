use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use metrics::{counter, histogram};

static METRICS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Metric names and labels shared by the relay crates.
pub struct RelayTelemetry;

impl RelayTelemetry {
    pub fn set_enabled(enabled: bool) {
        METRICS_ENABLED.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled() -> bool {
        METRICS_ENABLED.load(Ordering::Relaxed)
    }

    /// `status` is `success` or `failure`.
    pub fn record_request(component: &'static str, status: &'static str) {
        if !Self::is_enabled() {
            return;
        }
        counter!("relay_requests_total", "component" => component, "status" => status)
            .increment(1);
    }

    pub fn record_retry(component: &'static str) {
        if !Self::is_enabled() {
            return;
        }
        counter!("relay_retries_total", "component" => component).increment(1);
    }

    /// `result` is `hit`, `miss` or `expired`.
    pub fn record_cache_lookup(result: &'static str) {
        if !Self::is_enabled() {
            return;
        }
        counter!("relay_cache_lookups_total", "result" => result).increment(1);
    }

    /// `kind` is `mock` or `rethrow`.
    pub fn record_fallback(kind: &'static str) {
        if !Self::is_enabled() {
            return;
        }
        counter!("relay_fallbacks_total", "kind" => kind).increment(1);
    }

    pub fn record_agent_call(status: &'static str) {
        if !Self::is_enabled() {
            return;
        }
        counter!("relay_agent_calls_total", "status" => status).increment(1);
    }

    pub fn record_workflow_step(backend: &'static str, status: &'static str) {
        if !Self::is_enabled() {
            return;
        }
        counter!("relay_workflow_steps_total", "backend" => backend, "status" => status)
            .increment(1);
    }

    pub fn record_latency(component: &'static str, duration_ms: f64) {
        if !Self::is_enabled() {
            return;
        }
        histogram!("relay_request_duration_ms", "component" => component).record(duration_ms);
    }
}

pub struct RequestTimer {
    start: Instant,
    component: &'static str
}

impl RequestTimer {
    pub fn new(component: &'static str) -> Self {
        Self {
            start: Instant::now(),
            component
        }
    }

    /// Record the elapsed time and return it in milliseconds.
    pub fn finish(self) -> u64 {
        let elapsed = self.start.elapsed().as_millis() as u64;
        RelayTelemetry::record_latency(self.component, elapsed as f64);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::CompositeKey;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use serial_test::serial;

    type SnapshotVec = Vec<(
        CompositeKey,
        Option<metrics::Unit>,
        Option<metrics::SharedString>,
        DebugValue
    )>;

    fn with_test_recorder<F, R>(f: F) -> (R, SnapshotVec)
    where
        F: FnOnce() -> R
    {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        let result = metrics::with_local_recorder(&recorder, f);
        let snapshot = snapshotter.snapshot().into_vec();

        (result, snapshot)
    }

    fn counter_value(snapshot: &SnapshotVec, name: &str, labels: &[(&str, &str)]) -> Option<u64> {
        snapshot.iter().find_map(|(k, _, _, v)| {
            if k.key().name() != name {
                return None;
            }
            let key_labels: Vec<_> = k.key().labels().collect();
            let matches = labels.iter().all(|(label_name, label_value)| {
                key_labels
                    .iter()
                    .any(|l| l.key() == *label_name && l.value() == *label_value)
            });
            match (matches, v) {
                (true, DebugValue::Counter(count)) => Some(*count),
                _ => None
            }
        })
    }

    #[test]
    #[serial]
    fn test_cache_lookup_counters() {
        let (_, snapshot) = with_test_recorder(|| {
            RelayTelemetry::record_cache_lookup("hit");
            RelayTelemetry::record_cache_lookup("hit");
            RelayTelemetry::record_cache_lookup("miss");
        });

        assert_eq!(
            counter_value(&snapshot, "relay_cache_lookups_total", &[("result", "hit")]),
            Some(2)
        );
        assert_eq!(
            counter_value(&snapshot, "relay_cache_lookups_total", &[("result", "miss")]),
            Some(1)
        );
    }

    #[test]
    #[serial]
    fn test_request_and_step_labels() {
        let (_, snapshot) = with_test_recorder(|| {
            RelayTelemetry::record_request("connection", "failure");
            RelayTelemetry::record_workflow_step("agent", "success");
        });

        assert_eq!(
            counter_value(
                &snapshot,
                "relay_requests_total",
                &[("component", "connection"), ("status", "failure")]
            ),
            Some(1)
        );
        assert_eq!(
            counter_value(
                &snapshot,
                "relay_workflow_steps_total",
                &[("backend", "agent"), ("status", "success")]
            ),
            Some(1)
        );
    }

    #[test]
    #[serial]
    fn test_timer_records_histogram() {
        let (elapsed, snapshot) = with_test_recorder(|| RequestTimer::new("fallback").finish());

        assert!(elapsed < 1_000);
        assert!(
            snapshot
                .iter()
                .any(|(k, _, _, _)| k.key().name() == "relay_request_duration_ms")
        );
    }

    #[test]
    #[serial]
    fn test_disabled_records_nothing() {
        RelayTelemetry::set_enabled(false);
        let (_, snapshot) = with_test_recorder(|| {
            RelayTelemetry::record_fallback("mock");
        });
        RelayTelemetry::set_enabled(true);

        assert!(snapshot.is_empty());
    }
}
