//! Observability features: metrics and tracing.
//!
//! ## Metrics
//!
//! The camera source exposes the following metrics, labelled with the
//! element name:
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `omxcamsrc_frames_produced` | Counter | Complete frames delivered |
//! | `omxcamsrc_frames_corrupted` | Counter | Frames delivered zeroed and flagged corrupted |
//! | `omxcamsrc_fragments_received` | Counter | Hardware fragments consumed |
//! | `omxcamsrc_bytes_copied` | Counter | Bytes copied into output frames |
//! | `omxcamsrc_frame_assembly_time_ns` | Histogram | Time spent assembling one frame |
//!
//! Install any `metrics` recorder (prometheus, statsd, ...) to collect them.
//!
//! ## Tracing
//!
//! Lifecycle operations run inside an `element` span and, when enabled,
//! each frame inside a `frame` span. See [`TracingConfig`].
//!
//! ```rust
//! use omxcamsrc::observability::{ElementMetrics, init_metrics};
//!
//! init_metrics();
//! let metrics = ElementMetrics::new("camera0");
//! metrics.record_frame(194_400, 17);
//! ```

mod metrics;
mod tracing_support;

pub use metrics::{ElementMetrics, TimerGuard, init_metrics};
pub use tracing_support::{TracingConfig, span_element, span_frame};
