use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};

/// Prometheus collectors for the allocation subsystem.
///
/// Shared behind an `Arc` by the controller, the notification channel and any HTTP exporter.
pub struct SwarmMetrics {
    pub registry: Registry,
    /// Robot state updates accepted by the store.
    pub robot_updates_total: IntCounter,
    /// Robot state updates ignored because of an unknown robot id.
    pub robot_updates_ignored_total: IntCounter,
    pub recomputes_total: IntCounter,
    pub announcements_sent_total: IntCounter,
    pub broadcasts_sent_total: IntCounter,
    pub announcement_failures_total: IntCounter,
    pub tasks: IntGauge,
    pub tasks_completed: IntGauge,
    pub assignments_active: IntGauge,
    pub recompute_duration_seconds: Histogram,
}

impl SwarmMetrics {
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("swarm".into()), None)
            .expect("Failed to create custom metrics registry");

        macro_rules! reg {
            ($metric:expr) => {{
                let collector = $metric;
                registry
                    .register(Box::new(collector.clone()))
                    .expect("Failed to register metric");
                collector
            }};
        }

        Self {
            robot_updates_total: reg!(IntCounter::new(
                "robot_updates_total",
                "Total robot state updates applied"
            )
            .unwrap()),
            robot_updates_ignored_total: reg!(IntCounter::new(
                "robot_updates_ignored_total",
                "Total robot state updates ignored for an unknown robot id"
            )
            .unwrap()),
            recomputes_total: reg!(IntCounter::new(
                "recomputes_total",
                "Total allocation recomputes"
            )
            .unwrap()),
            announcements_sent_total: reg!(IntCounter::new(
                "announcements_sent_total",
                "Total assignment announcement datagrams handed to the transport"
            )
            .unwrap()),
            broadcasts_sent_total: reg!(IntCounter::new(
                "broadcasts_sent_total",
                "Total fleet-wide broadcast datagrams handed to the transport"
            )
            .unwrap()),
            announcement_failures_total: reg!(IntCounter::new(
                "announcement_failures_total",
                "Total announcement or broadcast sends that failed"
            )
            .unwrap()),
            tasks: reg!(IntGauge::new("tasks", "Number of known tasks").unwrap()),
            tasks_completed: reg!(IntGauge::new(
                "tasks_completed",
                "Number of completed tasks"
            )
            .unwrap()),
            assignments_active: reg!(IntGauge::new(
                "assignments_active",
                "Number of entries in the current assignment map"
            )
            .unwrap()),
            recompute_duration_seconds: reg!(Histogram::with_opts(
                HistogramOpts::new(
                    "recompute_duration_seconds",
                    "Time spent in snapshot, allocation and commit"
                )
                .buckets(prometheus::exponential_buckets(0.00001, 4.0, 10).unwrap())
            )
            .unwrap()),
            registry,
        }
    }
}

impl Default for SwarmMetrics {
    fn default() -> Self {
        Self::new()
    }
}
