//! Tracing integration for structured logging and spans.

use tracing::{Level, Span, span};

/// Configuration for tracing behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Whether lifecycle and negotiation operations run inside a span.
    pub element_spans: bool,
    /// Whether every frame runs inside a span.
    pub frame_spans: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            element_spans: true,
            frame_spans: false, // Per-frame, can be expensive
        }
    }
}

impl TracingConfig {
    /// Enable all spans.
    pub fn all() -> Self {
        Self {
            element_spans: true,
            frame_spans: true,
        }
    }

    /// Disable all spans.
    pub fn none() -> Self {
        Self {
            element_spans: false,
            frame_spans: false,
        }
    }

    /// Span for a lifecycle operation, or a disabled span.
    pub fn element(&self, element: &str, operation: &'static str) -> Span {
        if self.element_spans {
            span_element(element, operation)
        } else {
            Span::none()
        }
    }

    /// Span for one frame, or a disabled span.
    pub fn frame(&self, element: &str, frame: u64) -> Span {
        if self.frame_spans {
            span_frame(element, frame)
        } else {
            Span::none()
        }
    }
}

/// Create a span for a lifecycle operation.
///
/// ```rust
/// use omxcamsrc::observability::span_element;
///
/// let span = span_element("camera0", "start");
/// let _guard = span.enter();
/// ```
#[inline]
pub fn span_element(element: &str, operation: &'static str) -> Span {
    span!(Level::DEBUG, "element", element = %element, operation = operation)
}

/// Create a span for assembling one frame.
#[inline]
pub fn span_frame(element: &str, frame: u64) -> Span {
    span!(Level::TRACE, "frame", element = %element, frame = frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config_default() {
        let config = TracingConfig::default();
        assert!(config.element_spans);
        assert!(!config.frame_spans);
    }

    #[test]
    fn test_disabled_spans() {
        let config = TracingConfig::none();
        assert!(config.element("camera0", "start").is_none());
        assert!(config.frame("camera0", 0).is_none());
    }

    #[test]
    fn test_span_creation() {
        let _span = span_element("camera0", "stop");
        let _span = span_frame("camera0", 3);
    }
}
