//! Capability negotiation with the pipeline.
//!
//! Negotiation is a multi-call protocol: query (`get_caps`), pick one
//! concrete format (`fixate`), commit (`set_caps`). The calls must come in
//! that order; anything else fails with [`NegotiationError::OutOfOrder`]
//! instead of silently working on stale data.
//!
//! Committing a format pushes its geometry to the hardware output port (and
//! to the encoder when the format is compressed) and reads back the
//! fragment layout the port will deliver.

use super::catalog::PortFormatDescriptor;
use super::live::{Live, LiveState};
use super::reassembler::{FragmentGeometry, FrameReassembler};
use crate::error::{Error, Result};
use crate::format::{Caps, Framerate, VideoCaps};
use crate::il::{
    ComponentRole, ComponentState, Config, ConfigKey, IlComponent, IlError, Param, PortRole,
    VideoPortFormat,
};
use crate::video_info::{VideoInfo, round_up};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Progress of the negotiation protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NegotiationPhase {
    /// Nothing known about the hardware formats yet.
    #[default]
    Unnegotiated,
    /// Hardware formats were probed and offered.
    ProbedCandidates,
    /// A single concrete format was chosen.
    ///
    /// Reached again from `Committed` on renegotiation. The previously
    /// committed format stays in use until the next commit succeeds.
    Fixated,
    /// The format was pushed to the hardware.
    Committed,
}

impl fmt::Display for NegotiationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unnegotiated => "unnegotiated",
            Self::ProbedCandidates => "probed",
            Self::Fixated => "fixated",
            Self::Committed => "committed",
        })
    }
}

/// Negotiation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// No probed hardware format can produce the requested caps.
    #[error("no hardware format matches {0}")]
    NoMatchingFormat(String),

    /// The caps leave no value to fixate to.
    #[error("cannot fixate {0}")]
    CannotFixate(String),

    /// The caps passed to `set_caps` are not fully fixed.
    #[error("caps are not fixed: {0}")]
    NotFixed(String),

    /// A negotiation call arrived in the wrong phase.
    #[error("{operation} requires the {expected} phase, negotiation is {actual}")]
    OutOfOrder {
        /// Rejected operation.
        operation: &'static str,
        /// Phase the operation needs.
        expected: NegotiationPhase,
        /// Current phase.
        actual: NegotiationPhase,
    },

    /// Writing the format to the hardware failed.
    #[error("failed to push {what} to hardware: {source}")]
    HardwarePush {
        /// What was being written.
        what: &'static str,
        /// Hardware error.
        source: IlError,
    },
}

/// The committed output format.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedFormat {
    /// Hardware format the caps matched.
    pub descriptor: PortFormatDescriptor,
    /// The committed caps structure.
    pub caps: VideoCaps,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in rows.
    pub height: u32,
    /// Frame rate.
    pub framerate: Framerate,
    /// Frame rate as a float.
    pub fps: f64,
    /// Row stride pushed to the hardware.
    pub stride: usize,
    /// Port frames are acquired from.
    pub buffer_port: PortRole,
    /// Destination frame geometry (raw output).
    pub frame: Option<VideoInfo>,
    /// Fragment layout (sliced raw output).
    pub fragment: Option<FragmentGeometry>,
}

impl NegotiatedFormat {
    /// Check if frames are uncompressed.
    pub fn is_raw(&self) -> bool {
        self.descriptor.is_raw()
    }

    /// A reassembler for this format.
    pub fn reassembler(&self) -> FrameReassembler {
        match self.frame {
            Some(frame) => FrameReassembler::raw(frame, self.fragment, self.descriptor.is_packed),
            None => FrameReassembler::compressed(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Negotiation {
    pub phase: NegotiationPhase,
    pub format: Option<NegotiatedFormat>,
}

impl Negotiation {
    fn require_at_least(
        &self,
        operation: &'static str,
        expected: NegotiationPhase,
    ) -> std::result::Result<(), NegotiationError> {
        if self.phase < expected {
            return Err(NegotiationError::OutOfOrder {
                operation,
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn require(
        &self,
        operation: &'static str,
        expected: NegotiationPhase,
    ) -> std::result::Result<(), NegotiationError> {
        if self.phase != expected {
            return Err(NegotiationError::OutOfOrder {
                operation,
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn reset_to_candidates(&mut self) {
        self.format = None;
        self.phase = NegotiationPhase::ProbedCandidates;
    }
}

fn push_failed(what: &'static str) -> impl Fn(IlError) -> Error {
    move |source| {
        tracing::error!(error = %source, "error while setting {what}");
        NegotiationError::HardwarePush { what, source }.into()
    }
}

impl LiveState {
    /// Ports whose formats are offered, preferred first.
    fn format_ports(&self) -> Vec<(Arc<dyn IlComponent>, u32)> {
        let mut roles = Vec::with_capacity(2);
        if self.target.is_extended() {
            roles.push(PortRole::EncoderOut);
        }
        roles.push(PortRole::CameraVideoOut);
        roles
            .into_iter()
            .filter_map(|role| self.port(role))
            .map(|port| (Arc::clone(port.component()), port.index()))
            .collect()
    }

    /// Probe every offered port, compressed outputs first.
    pub(crate) fn probe_all(&mut self) -> Vec<PortFormatDescriptor> {
        let mut all = Vec::new();
        for (component, port) in self.format_ports() {
            all.extend(self.catalog.probe(component.as_ref(), port).iter().cloned());
        }
        all
    }

    /// Components that format queries need are open.
    fn format_components_open(&self) -> bool {
        self.component(ComponentRole::Camera).is_some()
            && (!self.target.is_extended() || self.component(ComponentRole::Encoder).is_some())
    }

    /// Components that format queries need are in the Loaded state.
    fn format_components_loaded(&self) -> bool {
        let loaded = |role| {
            self.component(role)
                .is_none_or(|c| c.get_state() == ComponentState::Loaded)
        };
        loaded(ComponentRole::Camera) && (!self.target.is_extended() || loaded(ComponentRole::Encoder))
    }

    fn missing_format_component(&self) -> Error {
        if self.component(ComponentRole::Camera).is_none() {
            Error::ComponentMissing(ComponentRole::Camera)
        } else {
            Error::ComponentMissing(ComponentRole::Encoder)
        }
    }
}

/// Union of the capability templates of every probed hardware format,
/// intersected with `filter`. Falls back to `ANY` when nothing usable was
/// probed.
pub(crate) fn get_caps(live: &Live, filter: Option<&Caps>) -> Caps {
    let mut state = live.lock();

    let caps = if state.format_components_open() {
        state = live.wait_until(
            state,
            "components not in loaded state",
            LiveState::format_components_loaded,
        );
        let descriptors = state.probe_all();
        let caps: Caps = descriptors
            .iter()
            .filter_map(|d| d.template.clone())
            .collect();
        if caps.is_empty() {
            tracing::error!("no supported output formats handled by the hardware");
            Caps::any()
        } else {
            if state.negotiation.phase == NegotiationPhase::Unnegotiated {
                state.negotiation.phase = NegotiationPhase::ProbedCandidates;
            }
            caps
        }
    } else {
        tracing::debug!("camera not opened, returning base caps");
        Caps::any()
    };

    let caps = match filter {
        Some(filter) => caps.intersect(filter),
        None => caps,
    };
    tracing::debug!(%caps, "returning caps");
    caps
}

/// Truncate `caps` to its first structure and fixate it nearest to the
/// configured defaults.
///
/// Called after a commit, this starts a renegotiation: the phase drops to
/// `Fixated` while frames keep flowing in the committed format.
pub(crate) fn fixate(live: &Live, caps: Caps) -> Result<Caps> {
    let mut state = live.lock();
    state
        .negotiation
        .require_at_least("fixate", NegotiationPhase::ProbedCandidates)?;

    let defaults = state.fixate;
    let caps = caps.truncate();
    let fixed = caps
        .structures()
        .first()
        .and_then(|s| s.fixate_nearest(defaults.width, defaults.height, defaults.framerate))
        .ok_or_else(|| NegotiationError::CannotFixate(caps.to_string()))?;

    tracing::debug!(caps = %fixed, "fixated caps");
    state.negotiation.phase = NegotiationPhase::Fixated;
    Ok(Caps::from(fixed))
}

/// Commit `caps`: pick the first hardware format whose template contains
/// them and push the format to the hardware.
///
/// On failure the negotiated format is cleared, so later frame requests
/// fail with [`Error::NotNegotiated`].
pub(crate) fn set_caps(live: &Live, caps: &Caps) -> Result<()> {
    let mut state = live.lock();
    state
        .negotiation
        .require("set_caps", NegotiationPhase::Fixated)?;
    if !state.format_components_open() {
        return Err(state.missing_format_component());
    }

    let mut state = live.wait_until(
        state,
        "camera not configured or not in loaded state",
        |s| s.camera_configured && s.format_components_loaded(),
    );

    let result = commit(&mut state, caps);
    match &result {
        Ok(()) => state.negotiation.phase = NegotiationPhase::Committed,
        Err(err) => {
            tracing::error!(error = %err, "failed to set caps");
            state.negotiation.reset_to_candidates();
            state.video_configured = false;
        }
    }
    drop(state);
    live.broadcast();
    result
}

fn commit(state: &mut LiveState, caps: &Caps) -> Result<()> {
    let requested = match caps.structures() {
        [only] if only.is_fixed() => only.clone(),
        _ => return Err(NegotiationError::NotFixed(caps.to_string()).into()),
    };
    let not_fixed = || Error::from(NegotiationError::NotFixed(requested.to_string()));

    let descriptor = state
        .probe_all()
        .into_iter()
        .find(|d| {
            d.template
                .as_ref()
                .is_some_and(|template| requested.is_subset_of(template))
        })
        .ok_or_else(|| NegotiationError::NoMatchingFormat(requested.to_string()))?;
    tracing::debug!(
        compression = ?descriptor.compression,
        color = ?descriptor.color,
        "found port format for caps"
    );

    let width = *requested.width.as_fixed().ok_or_else(not_fixed)?;
    let height = *requested.height.as_fixed().ok_or_else(not_fixed)?;
    let framerate = *requested.framerate.as_fixed().ok_or_else(not_fixed)?;
    let frame = if descriptor.is_raw() {
        let layout = *requested.layout.as_fixed().ok_or_else(not_fixed)?;
        Some(VideoInfo::new(layout, width, height))
    } else {
        None
    };

    state.timing.fold();

    let buffer_port = if !state.target.is_extended() || descriptor.is_raw() {
        PortRole::CameraVideoOut
    } else {
        PortRole::EncoderOut
    };

    let stride = configure_video(state, &descriptor, width, height, framerate)?;

    let fragment = match frame {
        Some(frame) => {
            let port = state.require_port(buffer_port)?;
            let def = port
                .definition()
                .map_err(push_failed("buffer port definition"))?;
            let reported = usize::try_from(def.video.stride).unwrap_or(0);
            let fragment_stride = if reported > 0 { reported } else { stride };
            FragmentGeometry::new(
                frame.layout(),
                fragment_stride,
                def.video.slice_height as usize,
                frame.height(),
            )
        }
        None => None,
    };

    state.negotiation.format = Some(NegotiatedFormat {
        descriptor,
        caps: requested,
        width,
        height,
        framerate,
        fps: framerate.fps(),
        stride,
        buffer_port,
        frame,
        fragment,
    });
    Ok(())
}

/// Push the negotiated geometry to the camera output ports and, for
/// compressed output on the extended target, to the encoder. Returns the
/// stride written to the hardware.
fn configure_video(
    state: &mut LiveState,
    descriptor: &PortFormatDescriptor,
    width: u32,
    height: u32,
    framerate: Framerate,
) -> Result<usize> {
    let extended = state.target.is_extended();
    let chained = extended && !descriptor.is_raw();
    tracing::debug!(width, height, fps = framerate.fps(), "configuring video");

    let camera = Arc::clone(state.require_component(ComponentRole::Camera)?);
    let video_out = state.require_port(PortRole::CameraVideoOut)?.clone();

    let mut def = video_out
        .definition()
        .map_err(push_failed("video output port definition"))?;

    let alignment = def.buffer_alignment as usize;
    let stride = if alignment > 0 {
        round_up(width as usize, alignment)
    } else {
        round_up(width as usize, 4)
    };

    def.video.frame_width = width;
    def.video.frame_height = height;
    def.video.stride = i32::try_from(stride)
        .map_err(|_| IlError::BadParameter)
        .map_err(push_failed("video output stride"))?;
    def.video.framerate_q16 = framerate
        .to_q16()
        .ok_or_else(|| push_failed("video output frame rate")(IlError::BadParameter))?;
    // A tunneled encoder picks the camera color format itself.
    if !chained {
        def.video.color = descriptor.color;
    }
    video_out
        .set_definition(def)
        .map_err(push_failed("video output port definition"))?;

    let preview = if extended {
        let preview = state.require_port(PortRole::CameraPreviewOut)?.clone();
        let mut preview_def = def;
        preview_def.port = preview.index();
        preview
            .set_definition(preview_def)
            .map_err(push_failed("preview output port definition"))?;
        Some(preview)
    } else {
        None
    };

    match camera
        .get_config(ConfigKey::FrameRate {
            port: video_out.index(),
        })
        .map_err(push_failed("video output frame rate"))?
    {
        Config::FrameRate { port, .. } => camera
            .set_config(Config::FrameRate {
                port,
                q16: def.video.framerate_q16,
            })
            .map_err(push_failed("video output frame rate"))?,
        _ => return Err(push_failed("video output frame rate")(IlError::BadParameter)),
    }
    if let Some(preview) = &preview {
        camera
            .set_config(Config::FrameRate {
                port: preview.index(),
                q16: def.video.framerate_q16,
            })
            .map_err(push_failed("preview output frame rate"))?;
    }

    if chained {
        let encoder = Arc::clone(state.require_component(ComponentRole::Encoder)?);
        let encoder_out = state.require_port(PortRole::EncoderOut)?.clone();

        let mut enc_def = encoder_out
            .definition()
            .map_err(push_failed("encoder output port definition"))?;
        enc_def.video.frame_width = width;
        enc_def.video.frame_height = height;
        enc_def.video.stride = def.video.stride;
        enc_def.video.framerate_q16 = def.video.framerate_q16;
        enc_def.video.bitrate = state.config.target_bitrate();
        enc_def.video.color = descriptor.color;
        encoder_out
            .set_definition(enc_def)
            .map_err(push_failed("encoder output port definition"))?;

        encoder
            .set_parameter(Param::VideoBitrate {
                port: encoder_out.index(),
                control_rate: state.config.control_rate(),
                target_bitrate: state.config.target_bitrate(),
            })
            .map_err(push_failed("encoder bitrate"))?;
        encoder
            .set_parameter(Param::VideoPortFormat(VideoPortFormat {
                port: encoder_out.index(),
                index: 0,
                compression: descriptor.compression,
                color: descriptor.color,
            }))
            .map_err(push_failed("encoder port format"))?;
    }

    state.video_configured = true;
    Ok(stride)
}
