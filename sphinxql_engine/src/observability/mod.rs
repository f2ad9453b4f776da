pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::{global_metrics, FetchMetrics, FetchStats};
