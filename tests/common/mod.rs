//! Shared rigs for the integration tests.

#![allow(dead_code)]

use omxcamsrc::camera::{CameraSrc, FragmentGeometry};
use omxcamsrc::config::{ComponentConfig, ENCODER_COMPONENT, NULL_SINK_COMPONENT, SourceSettings};
use omxcamsrc::format::{Caps, Framerate, RawLayout, VideoCaps};
use omxcamsrc::il::mock::{MockComponent, MockCore};
use omxcamsrc::il::{ColorFormat, CompressionFormat, IlBuffer, IlBufferFlags, PortDirection};
use std::sync::Arc;

pub const PI_CAMERA: &str = "OMX.broadcom.camera";

pub struct Rig {
    pub core: Arc<MockCore>,
    pub cam: Arc<MockComponent>,
    pub src: Arc<CameraSrc>,
}

impl Rig {
    pub fn component(&self, name: &str) -> Arc<MockComponent> {
        self.core
            .component(name)
            .unwrap_or_else(|| panic!("{name} not registered"))
    }
}

/// Generic target, camera ports 0 (in) and 1 (out), I420 output.
pub fn generic_rig(slice_height: Option<u32>) -> Rig {
    generic_rig_with_formats(
        &[(CompressionFormat::Unused, ColorFormat::Yuv420PackedPlanar)],
        slice_height,
    )
}

pub fn generic_rig_with_formats(
    formats: &[(CompressionFormat, ColorFormat)],
    slice_height: Option<u32>,
) -> Rig {
    let core = Arc::new(MockCore::new());
    let cam = core.add_component("cam", &[(0, PortDirection::Input), (1, PortDirection::Output)]);
    cam.set_port_formats(1, formats);
    cam.force_slice_height(1, slice_height);
    let src = CameraSrc::new(
        "camsrc0",
        core.clone(),
        SourceSettings::new(ComponentConfig::new("core", "cam")),
    );
    Rig {
        core,
        cam,
        src: Arc::new(src),
    }
}

/// Raspberry Pi target with camera, null sink and encoder.
pub fn pi_rig(encoder_formats: &[(CompressionFormat, ColorFormat)]) -> Rig {
    let core = Arc::new(MockCore::new());
    let cam = core.add_component(
        PI_CAMERA,
        &[
            (73, PortDirection::Input),
            (70, PortDirection::Output),
            (71, PortDirection::Output),
        ],
    );
    cam.set_port_formats(
        71,
        &[(CompressionFormat::Unused, ColorFormat::Yuv420PackedPlanar)],
    );
    let sink = core.add_component(NULL_SINK_COMPONENT, &[(240, PortDirection::Input)]);
    sink.set_video_init(240, 1);
    let enc = core.add_component(
        ENCODER_COMPONENT,
        &[(200, PortDirection::Input), (201, PortDirection::Output)],
    );
    enc.set_video_init(200, 2);
    enc.set_port_formats(201, encoder_formats);

    let src = CameraSrc::new("camsrc0", core.clone(), SourceSettings::raspberry_pi());
    Rig {
        core,
        cam,
        src: Arc::new(src),
    }
}

pub fn i420(width: u32, height: u32, fps: Framerate) -> Caps {
    Caps::from(
        VideoCaps::raw(RawLayout::I420)
            .with_size(width, height)
            .with_framerate(fps),
    )
}

/// Start the source and commit `caps`.
pub fn negotiate(src: &CameraSrc, caps: &Caps) {
    if src.negotiation_phase() == omxcamsrc::camera::NegotiationPhase::Unnegotiated {
        src.start().unwrap();
    }
    src.get_caps(None);
    let fixed = src.fixate(caps.clone()).unwrap();
    src.set_caps(&fixed).unwrap();
}

/// Queue one sliced frame whose bytes are all `value`.
pub fn push_sliced_frame(
    component: &MockComponent,
    port: u32,
    geometry: &FragmentGeometry,
    frame_height: usize,
    first_id: u32,
    value: u8,
) -> u32 {
    let count = frame_height.div_ceil(geometry.slice_height());
    for i in 0..count {
        let flags = if i + 1 == count {
            IlBufferFlags::ENDOFFRAME
        } else {
            IlBufferFlags::NONE
        };
        component.push_fragment(
            port,
            IlBuffer::new(first_id + i as u32, vec![value; geometry.fragment_size()], flags),
        );
    }
    count as u32
}

/// Queue one unsliced frame of `size` bytes.
pub fn push_whole_frame(component: &MockComponent, port: u32, id: u32, size: usize, value: u8) {
    component.push_fragment(
        port,
        IlBuffer::new(id, vec![value; size], IlBufferFlags::ENDOFFRAME),
    );
}
