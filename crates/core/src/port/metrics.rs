// Metrics Port

/// Metric tags as `(name, value)` pairs
pub type Tags<'a> = &'a [(&'a str, &'a str)];

/// Counter for processed jobs, tagged with `status`
pub const JOBS_PROCESSED: &str = "jobs_processed";

/// Timing of successful job runs in milliseconds
pub const JOB_PROCESSING_TIME_MS: &str = "job_processing_time_ms";

/// Metrics sink
///
/// Fire-and-forget: implementations must not fail the caller.
pub trait Metrics: Send + Sync {
    fn increment_counter(&self, name: &str, tags: Tags<'_>);

    fn record_timing(&self, name: &str, millis: u64, tags: Tags<'_>);
}

/// Emits metrics as structured tracing events on target `csvjob::metrics`
pub struct TracingMetrics;

impl Metrics for TracingMetrics {
    fn increment_counter(&self, name: &str, tags: Tags<'_>) {
        tracing::info!(
            target: "csvjob::metrics",
            metric = name,
            kind = "counter",
            value = 1u64,
            tags = %format_tags(tags),
        );
    }

    fn record_timing(&self, name: &str, millis: u64, tags: Tags<'_>) {
        tracing::info!(
            target: "csvjob::metrics",
            metric = name,
            kind = "timing",
            value = millis,
            tags = %format_tags(tags),
        );
    }
}

/// Discards everything
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn increment_counter(&self, _name: &str, _tags: Tags<'_>) {}

    fn record_timing(&self, _name: &str, _millis: u64, _tags: Tags<'_>) {}
}

fn format_tags(tags: Tags<'_>) -> String {
    tags.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type SeriesKey = (String, Vec<(String, String)>);

    fn series(name: &str, tags: Tags<'_>) -> SeriesKey {
        let mut tags: Vec<(String, String)> = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        tags.sort();
        (name.to_string(), tags)
    }

    /// Records every metric call for assertions
    #[derive(Default)]
    pub struct RecordingMetrics {
        counters: Mutex<HashMap<SeriesKey, u64>>,
        timings: Mutex<HashMap<SeriesKey, Vec<u64>>>,
    }

    impl RecordingMetrics {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn counter(&self, name: &str, tags: Tags<'_>) -> u64 {
            self.counters
                .lock()
                .unwrap()
                .get(&series(name, tags))
                .copied()
                .unwrap_or(0)
        }

        pub fn timings(&self, name: &str, tags: Tags<'_>) -> Vec<u64> {
            self.timings
                .lock()
                .unwrap()
                .get(&series(name, tags))
                .cloned()
                .unwrap_or_default()
        }
    }

    impl Metrics for RecordingMetrics {
        fn increment_counter(&self, name: &str, tags: Tags<'_>) {
            *self
                .counters
                .lock()
                .unwrap()
                .entry(series(name, tags))
                .or_insert(0) += 1;
        }

        fn record_timing(&self, name: &str, millis: u64, tags: Tags<'_>) {
            self.timings
                .lock()
                .unwrap()
                .entry(series(name, tags))
                .or_default()
                .push(millis);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::RecordingMetrics;
    use super::*;

    #[test]
    fn test_recording_metrics_is_tag_order_insensitive() {
        let metrics = RecordingMetrics::new();
        metrics.increment_counter(JOBS_PROCESSED, &[("status", "success"), ("queue", "a")]);
        metrics.increment_counter(JOBS_PROCESSED, &[("queue", "a"), ("status", "success")]);

        assert_eq!(
            metrics.counter(JOBS_PROCESSED, &[("status", "success"), ("queue", "a")]),
            2
        );
        assert_eq!(metrics.counter(JOBS_PROCESSED, &[("status", "failure")]), 0);
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(format_tags(&[("status", "success")]), "status=success");
        assert_eq!(format_tags(&[]), "");
    }
}
