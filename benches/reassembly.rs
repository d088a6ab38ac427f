//! Frame reassembly benchmarks.

use bytes::Bytes;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use omxcamsrc::buffer::Buffer;
use omxcamsrc::camera::{FragmentGeometry, FrameReassembler};
use omxcamsrc::format::RawLayout;
use omxcamsrc::il::mock::MockCore;
use omxcamsrc::il::{IlBuffer, IlBufferFlags, PortDirection, PortHandle};
use omxcamsrc::video_info::VideoInfo;
use std::sync::Arc;

fn bench_sliced_i420(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassemble_sliced_i420");

    for (width, height) in [(640u32, 480u32), (1280, 720), (1920, 1080)] {
        let core = MockCore::new();
        let component = core.add_component("cam", &[(1, PortDirection::Output)]);
        let port = PortHandle::new(component.clone(), 1);

        let frame = VideoInfo::new(RawLayout::I420, width, height);
        let geometry =
            FragmentGeometry::new(RawLayout::I420, width as usize, 16, height as usize).unwrap();
        let reassembler = FrameReassembler::raw(frame, Some(geometry), true);
        let slice = Bytes::from(vec![0x80u8; geometry.fragment_size()]);
        let count = (height as usize).div_ceil(16);
        let mut dest = Buffer::new(frame.size());

        group.throughput(Throughput::Bytes(frame.size() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &reassembler,
            |b, reassembler| {
                b.iter_batched(
                    || {
                        for i in 0..count {
                            let flags = if i + 1 == count {
                                IlBufferFlags::ENDOFFRAME
                            } else {
                                IlBufferFlags::NONE
                            };
                            component.push_fragment(1, IlBuffer::new(i as u32, slice.clone(), flags));
                        }
                    },
                    |()| reassembler.poll(&port, &mut dest).unwrap(),
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_compressed(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassemble_compressed");

    let core = MockCore::new();
    let component = core.add_component("enc", &[(201, PortDirection::Output)]);
    let port = PortHandle::new(component.clone(), 201);
    let reassembler = FrameReassembler::compressed();

    for chunks in [1usize, 4, 16] {
        let chunk = Bytes::from(vec![0x42u8; 4096]);
        group.throughput(Throughput::Bytes((chunks * 4096) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunks), &chunks, |b, &chunks| {
            b.iter_batched(
                || {
                    for i in 0..chunks {
                        let flags = if i + 1 == chunks {
                            IlBufferFlags::ENDOFFRAME
                        } else {
                            IlBufferFlags::NONE
                        };
                        component.push_fragment(201, IlBuffer::new(i as u32, chunk.clone(), flags));
                    }
                    Buffer::new(chunks * 4096)
                },
                |mut dest| reassembler.poll(&port, &mut dest).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sliced_i420, bench_compressed);
criterion_main!(benches);
