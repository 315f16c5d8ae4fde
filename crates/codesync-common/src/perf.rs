//! Performance timing utilities for instrumentation.
//!
//! `web_time::Instant` maps to `Performance.now()` in the browser and
//! `std::time::Instant` elsewhere.

use web_time::Instant;

/// Measure the execution time of a closure and log it.
///
/// Returns the closure's result and logs the elapsed time via tracing.
pub fn measure<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::debug!(elapsed_ms, "{}", label);
    result
}

/// A guard that logs elapsed time when dropped.
///
/// Useful for timing blocks of code without closures.
pub struct TimingGuard {
    label: &'static str,
    start: Instant,
}

impl TimingGuard {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(elapsed_ms, "{}", self.label);
    }
}
