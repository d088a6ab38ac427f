//! Timestamps and frame numbering across captures and renegotiation.

mod common;

use common::{Rig, generic_rig, i420, negotiate, push_sliced_frame};
use omxcamsrc::buffer::Buffer;
use omxcamsrc::camera::{Flow, Interruption};
use omxcamsrc::clock::ClockTime;
use omxcamsrc::format::Framerate;

const WIDTH: u32 = 480;
const HEIGHT: u32 = 270;

fn next_frame(rig: &Rig, first_id: u32) -> (Buffer, u32) {
    let format = rig.src.negotiated_format().unwrap();
    let geometry = format.fragment.unwrap();
    let pushed = push_sliced_frame(&rig.cam, 1, &geometry, HEIGHT as usize, first_id, 0x20);

    let size = rig.src.decide_allocation(None).unwrap().size;
    let mut buffer = Buffer::new(size);
    assert_eq!(rig.src.fill(&mut buffer).unwrap(), Flow::Filled);
    (buffer, pushed)
}

#[test]
fn test_pts_equals_dts_and_advances_by_duration() {
    let rig = generic_rig(Some(16));
    negotiate(&rig.src, &i420(WIDTH, HEIGHT, Framerate::new(30000, 1001)));
    rig.src.start_capturing().unwrap();

    let mut id = 0;
    let mut expected_pts = ClockTime::ZERO;
    for n in 0..4u64 {
        let (buffer, pushed) = next_frame(&rig, id);
        id += pushed;
        let meta = buffer.metadata();
        assert_eq!(meta.pts, meta.dts);
        assert_eq!(meta.pts, expected_pts);
        assert_eq!(meta.offset, n);
        assert!(meta.duration.is_some());
        expected_pts = meta.pts + meta.duration;
    }
    // 4 frames at 29.97 fps
    assert_eq!(expected_pts, ClockTime::from_nanos(133_466_666));
}

#[test]
fn test_renegotiation_continues_the_timeline() {
    let rig = generic_rig(Some(16));
    negotiate(&rig.src, &i420(WIDTH, HEIGHT, Framerate::FPS_30));
    rig.src.start_capturing().unwrap();

    let mut id = 0;
    for _ in 0..3 {
        id += next_frame(&rig, id).1;
    }
    rig.src.stop_capturing().unwrap();

    negotiate(&rig.src, &i420(WIDTH, HEIGHT, Framerate::FPS_25));
    rig.src.start_capturing().unwrap();

    let (buffer, pushed) = next_frame(&rig, id);
    id += pushed;
    let meta = buffer.metadata();
    assert_eq!(meta.offset, 3);
    assert_eq!(meta.pts, ClockTime::from_millis(100));
    assert_eq!(meta.duration, ClockTime::from_millis(40));

    let (buffer, _) = next_frame(&rig, id);
    assert_eq!(buffer.metadata().offset, 4);
    assert_eq!(buffer.metadata().pts, ClockTime::from_millis(140));
}

#[test]
fn test_restart_resets_the_timeline() {
    let rig = generic_rig(Some(16));
    negotiate(&rig.src, &i420(WIDTH, HEIGHT, Framerate::FPS_25));
    rig.src.start_capturing().unwrap();
    let mut id = 0;
    for _ in 0..2 {
        id += next_frame(&rig, id).1;
    }
    rig.src.stop_capturing().unwrap();
    rig.src.stop();

    negotiate(&rig.src, &i420(WIDTH, HEIGHT, Framerate::FPS_25));
    rig.src.start_capturing().unwrap();
    let (buffer, _) = next_frame(&rig, id);
    assert_eq!(buffer.metadata().offset, 0);
    assert_eq!(buffer.metadata().pts, ClockTime::ZERO);
}

#[test]
fn test_unknown_framerate_has_no_duration() {
    let rig = generic_rig(Some(16));
    negotiate(&rig.src, &i420(WIDTH, HEIGHT, Framerate::new(0, 1)));
    rig.src.start_capturing().unwrap();

    let mut id = 0;
    for n in 0..3u64 {
        let (buffer, pushed) = next_frame(&rig, id);
        id += pushed;
        let meta = buffer.metadata();
        assert_eq!(meta.offset, n);
        assert_eq!(meta.pts, ClockTime::ZERO);
        assert!(meta.duration.is_none());
    }
}

#[test]
fn test_interrupted_fill_does_not_count() {
    let rig = generic_rig(Some(16));
    negotiate(&rig.src, &i420(WIDTH, HEIGHT, Framerate::FPS_25));
    rig.src.start_capturing().unwrap();

    let (_, mut id) = next_frame(&rig, 0);

    rig.cam.signal_eos(1);
    let size = rig.src.decide_allocation(None).unwrap().size;
    let mut buffer = Buffer::new(size);
    assert_eq!(
        rig.src.fill(&mut buffer).unwrap(),
        Flow::Interrupted(Interruption::Eos)
    );
    assert!(buffer.metadata().pts.is_none());

    let (buffer, pushed) = next_frame(&rig, id);
    id += pushed;
    assert_eq!(buffer.metadata().offset, 1);
    assert_eq!(buffer.metadata().pts, ClockTime::from_millis(40));
    assert!(id > pushed);
}
