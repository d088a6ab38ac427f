//! Negotiation protocol against the mock hardware layer.

mod common;

use common::{generic_rig, generic_rig_with_formats, i420, negotiate, pi_rig};
use omxcamsrc::buffer::Buffer;
use omxcamsrc::camera::{NegotiationError, NegotiationPhase};
use omxcamsrc::error::Error;
use omxcamsrc::format::{Caps, Framerate, MediaKind, RawLayout, VideoCaps};
use omxcamsrc::il::mock::MockOp;
use omxcamsrc::il::{ColorFormat, CompressionFormat, IlError, PortRole};
use std::sync::Arc;

#[test]
fn test_first_matching_format_wins() {
    // Both formats produce I420; the first one enumerated must be chosen.
    let rig = generic_rig_with_formats(
        &[
            (CompressionFormat::Unused, ColorFormat::Yuv420PackedPlanar),
            (CompressionFormat::Unused, ColorFormat::Yuv420Planar),
        ],
        None,
    );
    negotiate(&rig.src, &i420(320, 240, Framerate::FPS_30));

    let format = rig.src.negotiated_format().unwrap();
    assert_eq!(format.descriptor.color, ColorFormat::Yuv420PackedPlanar);
    assert!(format.descriptor.is_packed);
    assert_eq!(
        rig.cam.definition(1).unwrap().video.color,
        ColorFormat::Yuv420PackedPlanar
    );
}

#[test]
fn test_calls_out_of_order_are_rejected() {
    let rig = generic_rig(None);
    rig.src.start().unwrap();
    let caps = i420(320, 240, Framerate::FPS_30);

    assert!(matches!(
        rig.src.fixate(caps.clone()),
        Err(Error::Negotiation(NegotiationError::OutOfOrder {
            operation: "fixate",
            actual: NegotiationPhase::Unnegotiated,
            ..
        }))
    ));

    rig.src.get_caps(None);
    assert_eq!(rig.src.negotiation_phase(), NegotiationPhase::ProbedCandidates);
    assert!(matches!(
        rig.src.set_caps(&caps),
        Err(Error::Negotiation(NegotiationError::OutOfOrder {
            operation: "set_caps",
            expected: NegotiationPhase::Fixated,
            ..
        }))
    ));

    let fixed = rig.src.fixate(caps).unwrap();
    rig.src.set_caps(&fixed).unwrap();
    assert_eq!(rig.src.negotiation_phase(), NegotiationPhase::Committed);

    // A committed format can only be replaced through a new fixation.
    assert!(rig.src.set_caps(&fixed).is_err());
    // Querying again does not regress the phase.
    rig.src.get_caps(None);
    assert_eq!(rig.src.negotiation_phase(), NegotiationPhase::Committed);
}

#[test]
fn test_no_matching_format_clears_state() {
    let rig = generic_rig(None);
    negotiate(&rig.src, &i420(320, 240, Framerate::FPS_30));
    assert!(rig.src.negotiated_format().is_some());

    rig.src.get_caps(None);
    let nv12 = Caps::from(
        VideoCaps::raw(RawLayout::Nv12)
            .with_size(320, 240)
            .with_framerate(Framerate::FPS_30),
    );
    let fixed = rig.src.fixate(nv12).unwrap();
    let err = rig.src.set_caps(&fixed).unwrap_err();
    assert!(matches!(
        err,
        Error::Negotiation(NegotiationError::NoMatchingFormat(_))
    ));

    assert!(rig.src.negotiated_format().is_none());
    assert_eq!(rig.src.negotiation_phase(), NegotiationPhase::ProbedCandidates);
    let mut buffer = Buffer::new(64);
    assert!(matches!(rig.src.fill(&mut buffer), Err(Error::NotNegotiated)));
}

#[test]
fn test_unfixed_caps_are_rejected() {
    let rig = generic_rig(None);
    rig.src.start().unwrap();
    let caps = rig.src.get_caps(None);
    rig.src.fixate(caps.clone()).unwrap();

    let err = rig.src.set_caps(&caps).unwrap_err();
    assert!(matches!(
        err,
        Error::Negotiation(NegotiationError::NotFixed(_))
    ));
}

#[test]
fn test_filter_is_intersected() {
    let rig = generic_rig_with_formats(
        &[
            (CompressionFormat::Unused, ColorFormat::Yuv420PackedPlanar),
            (CompressionFormat::Unused, ColorFormat::Yuv422PackedPlanar),
        ],
        None,
    );
    rig.src.start().unwrap();

    let filter = Caps::from(VideoCaps::raw(RawLayout::Y42b).with_size(640, 480));
    let caps = rig.src.get_caps(Some(&filter));
    assert_eq!(caps.structures().len(), 1);
    assert_eq!(caps.structures()[0].layout.as_fixed(), Some(&RawLayout::Y42b));
    assert_eq!(caps.structures()[0].width.as_fixed(), Some(&640));

    let unrelated = Caps::from(VideoCaps::new(MediaKind::Theora));
    assert!(rig.src.get_caps(Some(&unrelated)).is_empty());
}

#[test]
fn test_blacklisted_formats_are_not_offered() {
    let rig = pi_rig(&[
        (CompressionFormat::Mjpeg, ColorFormat::Unused),
        (CompressionFormat::Vp7, ColorFormat::Unused),
        (CompressionFormat::Avc, ColorFormat::Unused),
    ]);
    rig.src.start().unwrap();

    let kinds: Vec<_> = rig
        .src
        .get_caps(None)
        .structures()
        .iter()
        .map(|s| s.kind)
        .collect();
    assert_eq!(kinds, vec![MediaKind::H264, MediaKind::RawVideo]);

    // The descriptors are still listed, only unmatchable.
    let encoder_formats = rig.src.port_formats(PortRole::EncoderOut);
    assert_eq!(encoder_formats.len(), 3);
    assert!(encoder_formats[0].template.is_none());
}

#[test]
fn test_target_bounds_apply() {
    let rig = pi_rig(&[]);
    rig.src.start().unwrap();
    let caps = rig.src.get_caps(None);
    let fixed = rig.src.fixate(caps).unwrap();
    let s = &fixed.structures()[0];
    assert_eq!(s.width.as_fixed(), Some(&480));
    assert_eq!(s.height.as_fixed(), Some(&270));
    assert_eq!(s.framerate.as_fixed(), Some(&Framerate::FPS_25));

    // Requests are clipped to the target bounds before fixation.
    rig.src.get_caps(None);
    let fixed = rig
        .src
        .fixate(rig.src.get_caps(Some(&Caps::from(
            VideoCaps::raw(RawLayout::I420).with_size_range(1000, 4000, 100, 200),
        ))))
        .unwrap();
    assert_eq!(fixed.structures()[0].width.as_fixed(), Some(&1000));
    assert_eq!(fixed.structures()[0].height.as_fixed(), Some(&200));
}

#[test]
fn test_no_usable_formats_fall_back_to_any() {
    let rig = generic_rig_with_formats(&[], None);
    rig.src.start().unwrap();
    assert!(rig.src.get_caps(None).is_any());
    assert_eq!(rig.src.negotiation_phase(), NegotiationPhase::Unnegotiated);

    let unknown = generic_rig_with_formats(
        &[(CompressionFormat::Unused, ColorFormat::Other(0x7f00_0001))],
        None,
    );
    unknown.src.start().unwrap();
    assert!(unknown.src.get_caps(None).is_any());
}

#[test]
fn test_probing_is_cached_until_stop() {
    let rig = generic_rig(None);
    rig.src.start().unwrap();

    let first = rig.src.port_formats(PortRole::CameraVideoOut);
    rig.cam.set_probe_error(1, Some(IlError::Hardware("busy".into())));
    let second = rig.src.port_formats(PortRole::CameraVideoOut);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!rig.src.get_caps(None).is_any());

    rig.src.stop();
    rig.src.start().unwrap();
    assert!(rig.src.port_formats(PortRole::CameraVideoOut).is_empty());
    assert!(rig.src.get_caps(None).is_any());
}

#[test]
fn test_failed_push_leaves_source_stoppable() {
    let rig = generic_rig(None);
    rig.src.start().unwrap();
    rig.src.get_caps(None);
    let fixed = rig.src.fixate(i420(320, 240, Framerate::FPS_30)).unwrap();

    rig.cam.inject_failure(
        MockOp::GetConfig,
        IlError::IncorrectStateOperation,
    );
    assert!(matches!(
        rig.src.set_caps(&fixed),
        Err(Error::Negotiation(NegotiationError::HardwarePush { .. }))
    ));
    rig.cam.clear_failure(MockOp::GetConfig);

    assert!(rig.src.negotiated_format().is_none());
    assert!(!rig.src.is_capture_active());
    rig.src.stop();
    assert_eq!(rig.src.negotiation_phase(), NegotiationPhase::Unnegotiated);
}

#[test]
fn test_frame_rate_beyond_q16_is_rejected() {
    let rig = generic_rig(None);
    rig.src.start().unwrap();
    rig.src.get_caps(None);
    let fixed = rig
        .src
        .fixate(i420(64, 32, Framerate::new(65536, 1)))
        .unwrap();

    assert!(matches!(
        rig.src.set_caps(&fixed),
        Err(Error::Negotiation(NegotiationError::HardwarePush { .. }))
    ));
    assert!(rig.src.negotiated_format().is_none());
    assert_eq!(rig.src.negotiation_phase(), NegotiationPhase::ProbedCandidates);
}
