//! Metrics collection using metrics-rs.

use metrics::{Counter, Histogram, Unit, counter, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Whether metrics have been initialized.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

const FRAMES_PRODUCED: &str = "omxcamsrc_frames_produced";
const FRAMES_CORRUPTED: &str = "omxcamsrc_frames_corrupted";
const FRAGMENTS_RECEIVED: &str = "omxcamsrc_fragments_received";
const BYTES_COPIED: &str = "omxcamsrc_bytes_copied";
const FRAME_ASSEMBLY_TIME_NS: &str = "omxcamsrc_frame_assembly_time_ns";

/// Initialize metrics descriptions.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    metrics::describe_counter!(
        FRAMES_PRODUCED,
        Unit::Count,
        "Total number of complete frames delivered"
    );
    metrics::describe_counter!(
        FRAMES_CORRUPTED,
        Unit::Count,
        "Total number of frames delivered zeroed and flagged corrupted"
    );
    metrics::describe_counter!(
        FRAGMENTS_RECEIVED,
        Unit::Count,
        "Total number of hardware fragments consumed"
    );
    metrics::describe_counter!(
        BYTES_COPIED,
        Unit::Bytes,
        "Total bytes copied into output frames"
    );
    metrics::describe_histogram!(
        FRAME_ASSEMBLY_TIME_NS,
        Unit::Nanoseconds,
        "Time to assemble a single frame from its fragments"
    );
}

/// Metrics collector for one camera source.
///
/// Handles are registered once with the element label and reused on the
/// per-frame path.
#[derive(Clone)]
pub struct ElementMetrics {
    element: String,
    frames_produced: Counter,
    frames_corrupted: Counter,
    fragments: Counter,
    bytes: Counter,
    assembly_time: Histogram,
}

impl ElementMetrics {
    /// Create a collector labelled with `element`.
    pub fn new(element: &str) -> Self {
        Self {
            element: element.to_string(),
            frames_produced: counter!(FRAMES_PRODUCED, "element" => element.to_string()),
            frames_corrupted: counter!(FRAMES_CORRUPTED, "element" => element.to_string()),
            fragments: counter!(FRAGMENTS_RECEIVED, "element" => element.to_string()),
            bytes: counter!(BYTES_COPIED, "element" => element.to_string()),
            assembly_time: histogram!(FRAME_ASSEMBLY_TIME_NS, "element" => element.to_string()),
        }
    }

    /// Record a complete frame.
    #[inline]
    pub fn record_frame(&self, bytes: usize, fragments: u32) {
        self.frames_produced.increment(1);
        self.fragments.increment(u64::from(fragments));
        self.bytes.increment(bytes as u64);
    }

    /// Record a frame delivered as corrupted.
    #[inline]
    pub fn record_corrupted(&self) {
        self.frames_corrupted.increment(1);
    }

    /// Record assembly time.
    #[inline]
    pub fn record_time(&self, duration: Duration) {
        self.assembly_time.record(duration.as_nanos() as f64);
    }

    /// Start a timer and return a guard that records on drop.
    pub fn start_timer(&self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            metrics: self,
        }
    }

    /// Get the element name.
    pub fn element(&self) -> &str {
        &self.element
    }
}

/// Guard that records assembly time when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    metrics: &'a ElementMetrics,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_time(self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        init_metrics();
        // Idempotent
        init_metrics();
    }

    #[test]
    fn test_element_metrics() {
        let metrics = ElementMetrics::new("camera0");
        metrics.record_frame(194_400, 17);
        metrics.record_corrupted();
        metrics.record_time(Duration::from_micros(50));
        assert_eq!(metrics.element(), "camera0");
    }

    #[test]
    fn test_timer_guard() {
        let metrics = ElementMetrics::new("timer-test");
        {
            let _timer = metrics.start_timer();
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
