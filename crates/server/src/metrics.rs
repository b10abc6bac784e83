//! Prometheus metrics (§10.1) — recorder init, gauge/counter descriptions,
//! and the `/metrics` handler.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Idempotent — returns `false` if
/// already initialized (matches the teacher's `init_metrics()`).
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("failed to set global metrics recorder (already set)");
        return false;
    }
    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("failed to store prometheus handle (already set)");
    }

    describe_metrics();
    tracing::info!("prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_gauge!("warden_cache_students_total", "Students currently in the entity store");
    describe_gauge!("warden_cache_sessions_total", "Sessions currently in the entity store");
    describe_gauge!("warden_cache_rules_total", "Rules currently in the entity store");
    describe_gauge!("warden_cache_profiles_total", "Profiles currently in the entity store");
    describe_counter!("warden_subscriber_reconnects_total", "Change subscriber reconnects");
    describe_counter!("warden_handler_dispatch_total", "Change handler dispatches by entity and operation");
    describe_gauge!("warden_tracker_sessions_active", "Session trackers currently held in memory");
    describe_gauge!("warden_tracker_rule_contexts_active", "Rule-context trackers currently held in memory");
    describe_counter!("warden_cleaner_runs_total", "Cleanup passes run");
    describe_counter!("warden_cleaner_sessions_removed_total", "Sessions removed by the cleaner");
    describe_counter!("warden_cleaner_rules_removed_total", "Rules removed by the cleaner");
}

pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub fn set_cache_gauges(students: usize, sessions: usize, rules: usize, profiles: usize) {
    gauge!("warden_cache_students_total").set(students as f64);
    gauge!("warden_cache_sessions_total").set(sessions as f64);
    gauge!("warden_cache_rules_total").set(rules as f64);
    gauge!("warden_cache_profiles_total").set(profiles as f64);
}

pub fn set_tracker_gauges(session_trackers: usize, rule_trackers: usize) {
    gauge!("warden_tracker_sessions_active").set(session_trackers as f64);
    gauge!("warden_tracker_rule_contexts_active").set(rule_trackers as f64);
}

pub fn record_cleanup(sessions_removed: usize, rules_removed: usize) {
    counter!("warden_cleaner_runs_total").increment(1);
    counter!("warden_cleaner_sessions_removed_total").increment(sessions_removed as u64);
    counter!("warden_cleaner_rules_removed_total").increment(rules_removed as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_before_init_is_none_unless_another_test_initialized_it() {
        let _ = render_metrics();
    }

    #[test]
    fn recording_helpers_do_not_panic_without_a_recorder() {
        set_cache_gauges(1, 2, 3, 4);
        set_tracker_gauges(1, 1);
        record_cleanup(1, 1);
    }
}
