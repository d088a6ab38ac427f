//! Reassembly of hardware fragments into output frames.
//!
//! The camera may deliver one frame as several fragments of `slice_height`
//! rows each, every plane padded to the port's `stride`. For packed planar
//! layouts the fragments are copied row by row into the destination frame
//! geometry. Everything else is appended as it arrives.
//!
//! The last fragment of a frame usually carries fewer valid rows than a
//! full slice: the remainder is discarded padding.

use crate::buffer::Buffer;
use crate::format::RawLayout;
use crate::il::{Acquire, IlBuffer, IlBufferFlags, IlError, PortHandle};
use crate::video_info::VideoInfo;
use thiserror::Error;

/// Per-frame data errors.
///
/// None of these is fatal to the source: the affected frame is zeroed and
/// flagged, and capture continues with the next one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The hardware flagged a fragment as corrupt.
    #[error("hardware reported corrupt data")]
    Corrupt,

    /// A fragment holds fewer bytes than its geometry requires.
    #[error("fragment too small: needed {needed} bytes, has {available}")]
    FragmentOverflow {
        /// Bytes the copy would read.
        needed: usize,
        /// Bytes the fragment holds.
        available: usize,
    },

    /// The fragments deliver more data than the frame can hold.
    #[error("frame overflow: needed {needed} bytes, room for {available}")]
    FrameOverflow {
        /// Bytes the copy would write.
        needed: usize,
        /// Bytes available in the frame.
        available: usize,
    },

    /// The frame ended before all rows were delivered.
    #[error("incomplete frame: copied {copied} of {expected} bytes")]
    Incomplete {
        /// Bytes delivered.
        copied: usize,
        /// Bytes expected.
        expected: usize,
    },

    /// A compressed frame ended without any payload.
    #[error("empty frame")]
    Empty,

    /// A fragment could not be handed back to the hardware.
    #[error("failed to release fragment: {0}")]
    Release(#[source] IlError),
}

/// Why a poll ended without a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// The port is flushing.
    Flushing,
    /// The port needs reconfiguration.
    Reconfigure,
    /// End of stream.
    Eos,
    /// The component reported an error.
    Error,
}

/// Result of a successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A complete frame was written to the destination.
    Complete {
        /// Bytes written.
        bytes: usize,
        /// Fragments consumed.
        fragments: u32,
    },
    /// Acquisition stopped before the frame completed. Not an error: the
    /// destination holds nothing meaningful and must not be pushed.
    Interrupted(Interruption),
}

/// Layout of the fragments delivered by a port.
///
/// # Examples
///
/// ```rust
/// use omxcamsrc::camera::FragmentGeometry;
/// use omxcamsrc::format::RawLayout;
///
/// let geometry = FragmentGeometry::new(RawLayout::I420, 640, 256, 480).unwrap();
/// assert_eq!(geometry.discard_rows(), 32);
/// assert_eq!(geometry.valid_rows(false), 256);
/// assert_eq!(geometry.valid_rows(true), 224);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentGeometry {
    stride: usize,
    slice_height: usize,
    frame_height: usize,
    fragment: VideoInfo,
}

impl FragmentGeometry {
    /// Geometry of `slice_height`-row fragments of a `frame_height`-row
    /// frame, each plane `stride` bytes wide.
    ///
    /// Returns `None` when the port does not slice frames.
    pub fn new(layout: RawLayout, stride: usize, slice_height: usize, frame_height: usize) -> Option<Self> {
        if stride == 0 || slice_height == 0 {
            return None;
        }
        let fragment = VideoInfo::new(
            layout,
            u32::try_from(stride).ok()?,
            u32::try_from(slice_height).ok()?,
        );
        Some(Self {
            stride,
            slice_height,
            frame_height,
            fragment,
        })
    }

    /// Row stride of the first plane in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Rows of the first plane per fragment.
    pub fn slice_height(&self) -> usize {
        self.slice_height
    }

    /// Plane layout inside one fragment.
    pub fn fragment(&self) -> &VideoInfo {
        &self.fragment
    }

    /// Size in bytes of one full fragment.
    pub fn fragment_size(&self) -> usize {
        self.fragment.size()
    }

    /// Padding rows at the end of the last fragment, first plane.
    pub fn discard_rows(&self) -> usize {
        discard(self.slice_height, self.frame_height)
    }

    /// Valid rows of the first plane in a fragment.
    pub fn valid_rows(&self, last: bool) -> usize {
        if last {
            self.slice_height - self.discard_rows()
        } else {
            self.slice_height
        }
    }

    /// Valid rows of `plane` in a fragment of `frame`.
    ///
    /// Sub-sampled planes carry fewer rows per fragment, so their padding is
    /// derived from their own height rather than from the first plane's.
    pub fn plane_valid_rows(&self, frame: &VideoInfo, plane: usize, last: bool) -> usize {
        let max_rows = self.fragment.plane_height(plane);
        if last {
            max_rows - discard(max_rows, frame.plane_height(plane))
        } else {
            max_rows
        }
    }
}

fn discard(slice: usize, height: usize) -> usize {
    if slice == 0 {
        return 0;
    }
    match height % slice {
        0 => 0,
        rem => slice - rem,
    }
}

/// Bytes of `frame` covered by plane rows.
fn frame_payload(frame: &VideoInfo) -> usize {
    (0..frame.n_planes())
        .map(|p| frame.stride(p) * frame.plane_height(p))
        .sum()
}

/// Assembles one output frame per [`poll`](Self::poll).
#[derive(Debug, Clone, Copy)]
pub struct FrameReassembler {
    frame: Option<VideoInfo>,
    fragment: Option<FragmentGeometry>,
    packed: bool,
}

impl FrameReassembler {
    /// Reassembler for raw frames of geometry `frame`.
    ///
    /// `fragment` describes sliced delivery; `packed` selects the row-wise
    /// copy for stride-padded planar layouts.
    pub fn raw(frame: VideoInfo, fragment: Option<FragmentGeometry>, packed: bool) -> Self {
        Self {
            frame: Some(frame),
            fragment,
            packed,
        }
    }

    /// Reassembler for compressed frames.
    pub fn compressed() -> Self {
        Self {
            frame: None,
            fragment: None,
            packed: false,
        }
    }

    /// Acquire fragments from `port` until one carries end-of-frame, writing
    /// them into `dest`.
    ///
    /// Blocks in acquisition without holding any lock of the caller. Every
    /// acquired fragment is released, whatever the copy outcome.
    pub fn poll(&self, port: &PortHandle, dest: &mut Buffer) -> Result<PollOutcome, FrameError> {
        let expected = match &self.frame {
            Some(frame) => {
                if dest.len() < frame.size() {
                    return Err(FrameError::FrameOverflow {
                        needed: frame.size(),
                        available: dest.len(),
                    });
                }
                frame_payload(frame)
            }
            None => dest.len(),
        };

        let mut copied = 0usize;
        let mut fragments = 0u32;
        loop {
            let fragment = match port.acquire() {
                Acquire::Buffer(buffer) => buffer,
                Acquire::Flushing => return Ok(PollOutcome::Interrupted(Interruption::Flushing)),
                Acquire::Reconfigure => {
                    return Ok(PollOutcome::Interrupted(Interruption::Reconfigure));
                }
                Acquire::Eos => return Ok(PollOutcome::Interrupted(Interruption::Eos)),
                Acquire::Error => return Ok(PollOutcome::Interrupted(Interruption::Error)),
            };

            let last = fragment.flags.contains(IlBufferFlags::ENDOFFRAME);
            tracing::trace!(
                id = fragment.id,
                filled = fragment.filled_len,
                last,
                "fragment acquired"
            );
            let copy = self.copy_fragment(&fragment, fragments as usize, last, copied, expected, dest);
            let released = port.release(fragment);
            copied += copy?;
            released.map_err(FrameError::Release)?;

            fragments += 1;
            if last {
                break;
            }
        }

        match &self.frame {
            Some(frame) => {
                if copied != expected {
                    return Err(FrameError::Incomplete { copied, expected });
                }
                dest.truncate(frame.size());
            }
            None => {
                if copied == 0 {
                    return Err(FrameError::Empty);
                }
                dest.truncate(copied);
            }
        }
        Ok(PollOutcome::Complete {
            bytes: copied,
            fragments,
        })
    }

    fn copy_fragment(
        &self,
        fragment: &IlBuffer,
        index: usize,
        last: bool,
        copied: usize,
        expected: usize,
        dest: &mut Buffer,
    ) -> Result<usize, FrameError> {
        if fragment.flags.contains(IlBufferFlags::DATACORRUPT) {
            return Err(FrameError::Corrupt);
        }
        let payload = fragment.payload();
        match (&self.frame, &self.fragment) {
            (Some(frame), Some(geometry)) if self.packed => {
                let produced = copy_rows(frame, geometry, payload, index, last, dest.as_mut_slice())?;
                if copied + produced > expected {
                    return Err(FrameError::FrameOverflow {
                        needed: copied + produced,
                        available: expected,
                    });
                }
                Ok(produced)
            }
            _ => {
                let end = copied + payload.len();
                if end > expected {
                    return Err(FrameError::FrameOverflow {
                        needed: end,
                        available: expected,
                    });
                }
                let Some(slot) = dest.as_mut_slice().get_mut(copied..end) else {
                    return Err(FrameError::FrameOverflow {
                        needed: end,
                        available: dest.len(),
                    });
                };
                slot.copy_from_slice(payload);
                Ok(payload.len())
            }
        }
    }
}

/// Copy the valid rows of fragment number `index` into `dest`, plane by
/// plane. Returns the destination bytes covered.
fn copy_rows(
    frame: &VideoInfo,
    geometry: &FragmentGeometry,
    payload: &[u8],
    index: usize,
    last: bool,
    dest: &mut [u8],
) -> Result<usize, FrameError> {
    let layout = geometry.fragment();
    let mut consumed = 0usize;
    let mut produced = 0usize;

    for plane in 0..frame.n_planes() {
        let rows = geometry.plane_valid_rows(frame, plane, last);
        let first_row = index * layout.plane_height(plane);
        let src_stride = layout.stride(plane);
        let dst_stride = frame.stride(plane);

        consumed += src_stride * rows;
        if consumed > payload.len() {
            return Err(FrameError::FragmentOverflow {
                needed: consumed,
                available: payload.len(),
            });
        }
        if first_row + rows > frame.plane_height(plane) {
            return Err(FrameError::FrameOverflow {
                needed: (first_row + rows) * dst_stride,
                available: frame.plane_height(plane) * dst_stride,
            });
        }

        let row_len = src_stride.min(dst_stride);
        for row in 0..rows {
            let src_at = layout.offset(plane) + row * src_stride;
            let dst_at = frame.offset(plane) + (first_row + row) * dst_stride;
            let src = payload
                .get(src_at..src_at + row_len)
                .ok_or(FrameError::FragmentOverflow {
                    needed: src_at + row_len,
                    available: payload.len(),
                })?;
            let available = dest.len();
            let dst = dest
                .get_mut(dst_at..dst_at + row_len)
                .ok_or(FrameError::FrameOverflow {
                    needed: dst_at + row_len,
                    available,
                })?;
            dst.copy_from_slice(src);
        }
        produced += dst_stride * rows;
    }
    Ok(produced)
}
