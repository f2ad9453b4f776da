use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

lazy_static::lazy_static! {
    static ref GLOBAL_METRICS: Arc<FetchMetrics> = Arc::new(FetchMetrics::new());
}

/// Process-wide fetch counters shared by every cursor.
pub fn global_metrics() -> Arc<FetchMetrics> {
    GLOBAL_METRICS.clone()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub rowsets_opened: u64,
    pub rows_streamed: u64,
    pub rows_buffered: u64,
    pub store_calls: u64,
    pub mode_conflicts: u64,
    pub handles_released: u64,
    pub executor_errors: u64,
}

pub struct FetchMetrics {
    stats: Arc<Mutex<FetchStats>>,
    start_time: Instant,
}

impl FetchMetrics {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(FetchStats::default())),
            start_time: Instant::now(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut FetchStats)) {
        if cfg!(feature = "observability") {
            if let Ok(mut stats) = self.stats.lock() {
                f(&mut stats);
            }
        }
    }

    pub fn record_rowset_opened(&self) {
        self.update(|s| s.rowsets_opened += 1);
    }

    pub fn record_rows_streamed(&self, rows: u64) {
        self.update(|s| s.rows_streamed += rows);
    }

    pub fn record_store(&self, rows: u64) {
        self.update(|s| {
            s.store_calls += 1;
            s.rows_buffered += rows;
        });
    }

    pub fn record_mode_conflict(&self) {
        self.update(|s| s.mode_conflicts += 1);
    }

    pub fn record_release(&self) {
        self.update(|s| s.handles_released += 1);
    }

    pub fn record_executor_error(&self) {
        self.update(|s| s.executor_errors += 1);
    }

    pub fn snapshot(&self) -> FetchStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for FetchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, feature = "observability"))]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_metrics_new() {
        let metrics = FetchMetrics::new();
        assert_eq!(metrics.snapshot(), FetchStats::default());
    }

    #[test]
    fn test_fetch_metrics_record() {
        let metrics = FetchMetrics::new();
        metrics.record_rowset_opened();
        metrics.record_rows_streamed(2);
        metrics.record_rows_streamed(1);
        metrics.record_store(10);
        metrics.record_store(0);
        metrics.record_mode_conflict();
        metrics.record_release();
        metrics.record_executor_error();

        let stats = metrics.snapshot();
        assert_eq!(stats.rowsets_opened, 1);
        assert_eq!(stats.rows_streamed, 3);
        assert_eq!(stats.store_calls, 2);
        assert_eq!(stats.rows_buffered, 10);
        assert_eq!(stats.mode_conflicts, 1);
        assert_eq!(stats.handles_released, 1);
        assert_eq!(stats.executor_errors, 1);
    }

    #[test]
    fn test_global_metrics_is_shared() {
        let a = global_metrics();
        let b = global_metrics();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_uptime_advances() {
        let metrics = FetchMetrics::default();
        std::thread::sleep(Duration::from_millis(1));
        assert!(metrics.uptime() >= Duration::from_millis(1));
    }
}
