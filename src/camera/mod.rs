//! The camera source element.
//!
//! [`CameraSrc`] drives a hardware camera component (and, on extended
//! targets, a chained null sink and video encoder) through its lifecycle,
//! negotiates an output format with the pipeline and produces one output
//! buffer per [`fill`](CameraSrc::fill).
//!
//! All control operations share one lock and one condition variable. Only
//! the blocking fragment acquisition inside `fill` runs without the lock,
//! so a flush issued by [`stop_capturing`](CameraSrc::stop_capturing) can
//! always interrupt it.
//!
//! # Example
//!
//! ```rust
//! use omxcamsrc::camera::{CameraSrc, Flow};
//! use omxcamsrc::config::{ComponentConfig, SourceSettings};
//! use omxcamsrc::il::mock::MockCore;
//! use omxcamsrc::il::{IlBuffer, IlBufferFlags, PortDirection};
//! use omxcamsrc::buffer::Buffer;
//! use std::sync::Arc;
//!
//! let core = Arc::new(MockCore::new());
//! let cam = core.add_component("cam", &[(0, PortDirection::Input), (1, PortDirection::Output)]);
//! cam.set_port_formats(1, &[(omxcamsrc::il::CompressionFormat::Avc, omxcamsrc::il::ColorFormat::Unused)]);
//!
//! let src = CameraSrc::new("camsrc0", core.clone(), SourceSettings::new(ComponentConfig::new("core", "cam")));
//! src.start().unwrap();
//! let caps = src.get_caps(None);
//! let caps = src.fixate(caps).unwrap();
//! src.set_caps(&caps).unwrap();
//! src.start_capturing().unwrap();
//!
//! cam.push_fragment(1, IlBuffer::new(0, vec![7u8; 100], IlBufferFlags::ENDOFFRAME));
//! let allocation = src.decide_allocation(Some(4096)).unwrap();
//! let mut buffer = Buffer::new(allocation.size);
//! assert_eq!(src.fill(&mut buffer).unwrap(), Flow::Filled);
//! assert_eq!(buffer.len(), 100);
//!
//! src.stop_capturing().unwrap();
//! src.stop();
//! ```

mod catalog;
mod lifecycle;
mod live;
mod negotiation;
mod reassembler;
mod sequencer;
mod state;

pub use catalog::{PortFormatCatalog, PortFormatDescriptor, raw_layout};
pub use lifecycle::STATE_TIMEOUT;
pub use negotiation::{NegotiatedFormat, NegotiationError, NegotiationPhase};
pub use reassembler::{FragmentGeometry, FrameError, FrameReassembler, Interruption, PollOutcome};
pub use state::{ElementState, StateChange};

use crate::buffer::Buffer;
use crate::clock::ClockTime;
use crate::config::{CameraConfiguration, HardwareTarget, SourceSettings};
use crate::error::{Error, Result};
use crate::format::Caps;
use crate::il::{ComponentRole, IlCore, PortRole};
use crate::observability::{ElementMetrics, TracingConfig};
use live::{Live, LiveState};
use std::sync::Arc;

/// Outcome of [`CameraSrc::fill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The buffer holds a frame (possibly flagged corrupted) and carries
    /// timestamps.
    Filled,
    /// Acquisition was interrupted. The buffer must not be pushed.
    Interrupted(Interruption),
}

/// Buffer pool requirements reported to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Size of every output buffer.
    pub size: usize,
    /// Whether the pool should carry raw-video plane metadata.
    pub video_pool: bool,
}

/// Hardware camera source.
///
/// `CameraSrc` is `Send + Sync`: the control thread and the streaming
/// thread share it behind an `Arc`.
pub struct CameraSrc {
    name: String,
    core: Arc<dyn IlCore>,
    live: Live,
    metrics: ElementMetrics,
    tracing: TracingConfig,
}

impl CameraSrc {
    /// Create a source named `name` using components from `core`.
    pub fn new(name: impl Into<String>, core: Arc<dyn IlCore>, settings: SourceSettings) -> Self {
        let name = name.into();
        let SourceSettings {
            target,
            component,
            camera,
            fixate,
        } = settings;
        Self {
            metrics: ElementMetrics::new(&name),
            name,
            core,
            live: Live::new(LiveState::new(target, component, fixate, camera)),
            tracing: TracingConfig::default(),
        }
    }

    /// Replace the span configuration.
    pub fn with_tracing(mut self, tracing: TracingConfig) -> Self {
        self.tracing = tracing;
        self
    }

    /// Element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hardware target this source was built for.
    pub fn target(&self) -> HardwareTarget {
        self.live.lock().target
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Open and configure the components.
    ///
    /// Synchronous: when this returns `Ok` the camera is configured and
    /// negotiation can proceed. On failure, call [`stop`](Self::stop) to
    /// release whatever was opened.
    pub fn start(&self) -> Result<()> {
        let _span = self.tracing.element(&self.name, "start").entered();
        lifecycle::start(&self.live, self.core.as_ref())
    }

    /// Return all components to Loaded and forget every handle, cached
    /// format and negotiation result. Never fails.
    pub fn stop(&self) {
        let _span = self.tracing.element(&self.name, "stop").entered();
        lifecycle::stop(&self.live);
    }

    // ------------------------------------------------------------------
    // Negotiation
    // ------------------------------------------------------------------

    /// Capabilities the hardware can produce, intersected with `filter`.
    ///
    /// Returns `ANY` before [`start`](Self::start) or when the hardware
    /// offers nothing usable.
    pub fn get_caps(&self, filter: Option<&Caps>) -> Caps {
        let _span = self.tracing.element(&self.name, "get_caps").entered();
        negotiation::get_caps(&self.live, filter)
    }

    /// Fixate `caps` to a single concrete format near the configured
    /// defaults.
    pub fn fixate(&self, caps: Caps) -> Result<Caps> {
        let _span = self.tracing.element(&self.name, "fixate").entered();
        negotiation::fixate(&self.live, caps)
    }

    /// Commit a fixed format and push it to the hardware.
    pub fn set_caps(&self, caps: &Caps) -> Result<()> {
        let _span = self.tracing.element(&self.name, "set_caps").entered();
        negotiation::set_caps(&self.live, caps)
    }

    /// Current negotiation phase.
    pub fn negotiation_phase(&self) -> NegotiationPhase {
        self.live.lock().negotiation.phase
    }

    /// The committed format, if any.
    pub fn negotiated_format(&self) -> Option<NegotiatedFormat> {
        self.live.lock().negotiation.format.clone()
    }

    /// Formats supported by the port opened for `role`. Empty when the
    /// port is not open.
    pub fn port_formats(&self, role: PortRole) -> Arc<[PortFormatDescriptor]> {
        let mut state = self.live.lock();
        let Some(port) = state.port(role).cloned() else {
            return Arc::from(Vec::new());
        };
        state.catalog.probe(port.component().as_ref(), port.index())
    }

    /// Size output buffers for the committed format.
    ///
    /// Blocks until a format is committed. `proposed` is the size offered
    /// by downstream; the larger of the two wins.
    pub fn decide_allocation(&self, proposed: Option<usize>) -> Result<Allocation> {
        let state = self.live.wait_until(self.live.lock(), "format not negotiated", |s| {
            s.negotiation.format.is_some()
        });
        let format = state.negotiation.format.as_ref().ok_or(Error::NotNegotiated)?;

        let size = match &format.frame {
            Some(frame) => frame.size(),
            None => match state.require_port(format.buffer_port)?.definition() {
                Ok(def) => def.buffer_size as usize,
                Err(err) => {
                    tracing::error!(error = %err, "failed to read buffer port definition");
                    0
                }
            },
        };
        let size = proposed.map_or(size, |p| p.max(size));
        tracing::debug!(size, "decided allocation");
        Ok(Allocation {
            size,
            video_pool: format.descriptor.is_packed,
        })
    }

    // ------------------------------------------------------------------
    // Capture
    // ------------------------------------------------------------------

    /// Bring the capture chain up and switch capture on.
    ///
    /// Blocks until a format has been committed.
    pub fn start_capturing(&self) -> Result<()> {
        let _span = self.tracing.element(&self.name, "start_capturing").entered();
        sequencer::start_capturing(&self.live)
    }

    /// Switch capture off and bring the capture chain down. Unblocks a
    /// pending [`fill`](Self::fill).
    pub fn stop_capturing(&self) -> Result<()> {
        let _span = self.tracing.element(&self.name, "stop_capturing").entered();
        sequencer::stop_capturing(&self.live)
    }

    /// Check if the camera is capturing.
    pub fn is_capture_active(&self) -> bool {
        self.live.lock().is_capture_active()
    }

    /// React to an element state change.
    ///
    /// `parent` performs the transition itself. Capture starts before a
    /// transition to Playing and stops after a transition out of it.
    pub fn change_state(
        &self,
        transition: StateChange,
        parent: impl FnOnce() -> Result<()>,
    ) -> Result<()> {
        tracing::debug!(%transition, "changing state");
        match transition {
            StateChange::PausedToPlaying => {
                self.start_capturing()?;
                parent()
            }
            StateChange::PlayingToPaused => {
                parent()?;
                self.stop_capturing()
            }
            _ => parent(),
        }
    }

    /// Fill `buffer` with the next frame.
    ///
    /// Waits for the camera to be opened and capturing. A frame damaged by
    /// the hardware or by a geometry mismatch is still delivered: zeroed
    /// and flagged corrupted and droppable. An interrupted acquisition
    /// leaves the buffer and the frame counters untouched.
    pub fn fill(&self, buffer: &mut Buffer) -> Result<Flow> {
        let (port, reassembler, frame_number) = {
            let state = self.live.lock();
            let chained = match &state.negotiation.format {
                Some(format) if state.video_configured => {
                    format.buffer_port == PortRole::EncoderOut
                }
                _ => return Err(Error::NotNegotiated),
            };
            let state = self.live.wait_until(state, "camera not opened", |s| {
                s.component(ComponentRole::Camera).is_some()
                    && (!chained || s.component(ComponentRole::Encoder).is_some())
            });
            let state = self
                .live
                .wait_until(state, "camera not capturing", LiveState::is_capture_active);

            let format = state.negotiation.format.as_ref().ok_or(Error::NotNegotiated)?;
            let port = state.require_port(format.buffer_port)?.clone();
            let timing = &state.timing;
            (
                port,
                format.reassembler(),
                timing.accum_frames + timing.n_frames,
            )
        };

        let outcome = {
            let _span = self.tracing.frame(&self.name, frame_number).entered();
            let _timer = self.metrics.start_timer();
            reassembler.poll(&port, buffer)
        };

        match outcome {
            Ok(PollOutcome::Interrupted(reason)) => {
                tracing::debug!(?reason, "frame acquisition interrupted");
                return Ok(Flow::Interrupted(reason));
            }
            Ok(PollOutcome::Complete { bytes, fragments }) => {
                let flags = &mut buffer.metadata_mut().flags;
                flags.live = true;
                flags.set_marker(true);
                self.metrics.record_frame(bytes, fragments);
            }
            Err(err) => {
                tracing::warn!(error = %err, frame = frame_number, "failed to assemble frame");
                buffer.memset(0);
                let flags = &mut buffer.metadata_mut().flags;
                flags.live = true;
                flags.corrupted = true;
                flags.droppable = true;
                self.metrics.record_corrupted();
            }
        }

        self.stamp(buffer);
        Ok(Flow::Filled)
    }

    /// Timestamp `buffer` and advance the frame counters.
    fn stamp(&self, buffer: &mut Buffer) {
        let mut state = self.live.lock();
        let framerate = state.negotiation.format.as_ref().map(|f| f.framerate);
        let timing = &mut state.timing;

        let pts = timing.accum_rtime.saturating_add(timing.running_time);
        let offset = timing.accum_frames + timing.n_frames;
        timing.n_frames += 1;

        let (duration, next) = match framerate {
            Some(rate) if rate.den > 0 && rate.num > 0 => {
                let next = ClockTime::SECOND
                    .mul_div(timing.n_frames * u64::from(rate.den), u64::from(rate.num));
                (next.saturating_sub(timing.running_time), next)
            }
            _ => (ClockTime::NONE, ClockTime::ZERO),
        };
        timing.running_time = next;

        let meta = buffer.metadata_mut();
        meta.pts = pts;
        meta.dts = pts;
        meta.duration = duration;
        meta.offset = offset;
        meta.offset_end = offset + 1;
        tracing::trace!(%pts, %duration, offset, "frame stamped");
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Snapshot of the tuning knobs.
    pub fn configuration(&self) -> CameraConfiguration {
        self.live.lock().config.clone()
    }

    /// Change the tuning knobs. The change applies atomically: if `update`
    /// fails nothing is changed. Values reach the hardware at the next
    /// [`start`](Self::start).
    pub fn update_configuration(
        &self,
        update: impl FnOnce(&mut CameraConfiguration) -> Result<()>,
    ) -> Result<()> {
        let mut state = self.live.lock();
        let mut config = state.config.clone();
        update(&mut config)?;
        state.config = config;
        Ok(())
    }

    /// Mirror the image horizontally.
    pub fn set_horizontal_flip(&self, flip: bool) {
        self.live.lock().config.set_horizontal_flip(flip);
    }

    /// Mirror the image vertically.
    pub fn set_vertical_flip(&self, flip: bool) {
        self.live.lock().config.set_vertical_flip(flip);
    }

    /// Check if the image is mirrored horizontally.
    pub fn horizontal_flip(&self) -> bool {
        self.live.lock().config.horizontal_flip()
    }

    /// Check if the image is mirrored vertically.
    pub fn vertical_flip(&self) -> bool {
        self.live.lock().config.vertical_flip()
    }

    /// Centering is not supported; always returns `false`.
    pub fn set_horizontal_center(&self, _center: i32) -> bool {
        false
    }

    /// Centering is not supported; always returns `false`.
    pub fn set_vertical_center(&self, _center: i32) -> bool {
        false
    }

    /// Centering is not supported; always returns `None`.
    pub fn horizontal_center(&self) -> Option<i32> {
        None
    }

    /// Centering is not supported; always returns `None`.
    pub fn vertical_center(&self) -> Option<i32> {
        None
    }
}

impl std::fmt::Debug for CameraSrc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.live.lock();
        f.debug_struct("CameraSrc")
            .field("name", &self.name)
            .field("target", &state.target)
            .field("camera_configured", &state.camera_configured)
            .field("video_configured", &state.video_configured)
            .field("phase", &state.negotiation.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComponentConfig, MirrorMode};
    use crate::format::{Framerate, RawLayout, VideoCaps};
    use crate::il::mock::{MockComponent, MockCore};
    use crate::il::{ColorFormat, CompressionFormat, IlBuffer, IlBufferFlags, PortDirection};
    use std::thread;
    use std::time::Duration;

    fn source() -> (Arc<CameraSrc>, Arc<MockComponent>) {
        let core = Arc::new(MockCore::new());
        let cam = core.add_component(
            "cam",
            &[(0, PortDirection::Input), (1, PortDirection::Output)],
        );
        cam.set_port_formats(
            1,
            &[(CompressionFormat::Unused, ColorFormat::Yuv420PackedPlanar)],
        );
        let src = CameraSrc::new(
            "camsrc0",
            core,
            SourceSettings::new(ComponentConfig::new("core", "cam")),
        );
        (Arc::new(src), cam)
    }

    fn negotiate(src: &CameraSrc, width: u32, height: u32, fps: Framerate) {
        src.start().unwrap();
        src.get_caps(None);
        let caps = src
            .fixate(Caps::from(
                VideoCaps::raw(RawLayout::I420)
                    .with_size(width, height)
                    .with_framerate(fps),
            ))
            .unwrap();
        src.set_caps(&caps).unwrap();
    }

    #[test]
    fn test_fill_before_negotiation() {
        let (src, _cam) = source();
        let mut buffer = Buffer::new(16);
        assert!(matches!(src.fill(&mut buffer), Err(Error::NotNegotiated)));
    }

    #[test]
    fn test_decide_allocation_uses_frame_size() {
        let (src, _cam) = source();
        negotiate(&src, 64, 36, Framerate::FPS_30);
        let allocation = src.decide_allocation(None).unwrap();
        assert_eq!(allocation.size, 64 * 36 * 3 / 2);
        assert!(allocation.video_pool);
        assert_eq!(src.decide_allocation(Some(1 << 20)).unwrap().size, 1 << 20);
    }

    #[test]
    fn test_fill_stamps_and_counts() {
        let (src, cam) = source();
        negotiate(&src, 64, 36, Framerate::FPS_30);
        src.start_capturing().unwrap();

        let size = src.decide_allocation(None).unwrap().size;
        for id in 0..2 {
            cam.push_fragment(1, IlBuffer::new(id, vec![1u8; size], IlBufferFlags::ENDOFFRAME));
        }
        let mut durations = Vec::new();
        for expected in 0..2u64 {
            let mut buffer = Buffer::new(size);
            assert_eq!(src.fill(&mut buffer).unwrap(), Flow::Filled);
            let meta = buffer.metadata();
            assert_eq!(meta.offset, expected);
            assert_eq!(meta.offset_end, expected + 1);
            assert!(meta.flags.live && meta.flags.marker);
            durations.push(meta.duration);
        }
        assert_eq!(
            durations,
            vec![ClockTime::from_nanos(33_333_333); 2]
        );
    }

    #[test]
    fn test_fill_waits_for_capture() {
        let (src, cam) = source();
        negotiate(&src, 64, 36, Framerate::FPS_30);
        let size = src.decide_allocation(None).unwrap().size;
        cam.push_fragment(1, IlBuffer::new(0, vec![0u8; size], IlBufferFlags::ENDOFFRAME));

        let filler = Arc::clone(&src);
        let handle = thread::spawn(move || {
            let mut buffer = Buffer::new(size);
            filler.fill(&mut buffer).map(|flow| (flow, buffer.metadata().offset))
        });
        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        src.start_capturing().unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), (Flow::Filled, 0));
    }

    #[test]
    fn test_change_state_runs_capture_around_parent() {
        let (src, _cam) = source();
        negotiate(&src, 64, 36, Framerate::FPS_30);

        let mut seen = None;
        src.change_state(StateChange::PausedToPlaying, || {
            seen = Some(src.is_capture_active());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, Some(true));

        src.change_state(StateChange::PlayingToPaused, || {
            seen = Some(src.is_capture_active());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, Some(true));
        assert!(!src.is_capture_active());
    }

    #[test]
    fn test_flips_update_mirror() {
        let (src, _cam) = source();
        src.set_horizontal_flip(true);
        src.set_vertical_flip(true);
        assert!(src.horizontal_flip() && src.vertical_flip());
        assert_eq!(src.configuration().mirror(), MirrorMode::Both);
        assert!(!src.set_horizontal_center(10));
        assert_eq!(src.vertical_center(), None);
    }

    #[test]
    fn test_rejected_update_changes_nothing() {
        let (src, _cam) = source();
        let before = src.configuration();
        let result = src.update_configuration(|c| {
            c.set_contrast(10)?;
            c.set_contrast(500)
        });
        assert!(matches!(result, Err(Error::InvalidProperty { .. })));
        assert_eq!(src.configuration(), before);
    }

    #[test]
    fn test_stop_resets_negotiation() {
        let (src, _cam) = source();
        negotiate(&src, 64, 36, Framerate::FPS_30);
        assert_eq!(src.negotiation_phase(), NegotiationPhase::Committed);
        src.stop();
        assert_eq!(src.negotiation_phase(), NegotiationPhase::Unnegotiated);
        assert!(src.negotiated_format().is_none());
        assert!(src.get_caps(None).is_any());
    }
}
