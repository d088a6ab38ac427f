//! Plane geometry of raw video frames.
//!
//! [`VideoInfo`] computes per-plane strides, offsets and row counts for a
//! [`RawLayout`] at a given size. The same computation describes both a
//! whole output frame and a single hardware fragment (a frame `stride`
//! wide and `slice_height` tall).

use crate::format::RawLayout;

/// Round `v` up to a multiple of `n` (power of two).
#[inline]
pub const fn round_up(v: usize, n: usize) -> usize {
    (v + n - 1) & !(n - 1)
}

/// Maximum number of planes of any supported layout.
pub const MAX_PLANES: usize = 3;

/// Geometry of one raw video frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoInfo {
    layout: RawLayout,
    width: usize,
    height: usize,
    n_planes: usize,
    strides: [usize; MAX_PLANES],
    offsets: [usize; MAX_PLANES],
    plane_heights: [usize; MAX_PLANES],
    size: usize,
}

impl VideoInfo {
    /// Compute the geometry of a `width` x `height` frame in `layout`.
    pub fn new(layout: RawLayout, width: u32, height: u32) -> Self {
        let w = width as usize;
        let h = height as usize;
        let mut strides = [0; MAX_PLANES];
        let mut offsets = [0; MAX_PLANES];
        let mut plane_heights = [h, 0, 0];

        let (n_planes, size) = match layout {
            RawLayout::I420 => {
                strides[0] = round_up(w, 4);
                strides[1] = round_up(round_up(w, 2) / 2, 4);
                strides[2] = strides[1];
                let chroma_rows = round_up(h, 2) / 2;
                offsets[1] = strides[0] * round_up(h, 2);
                offsets[2] = offsets[1] + strides[1] * chroma_rows;
                plane_heights[1] = h.div_ceil(2);
                plane_heights[2] = h.div_ceil(2);
                (3, offsets[2] + strides[2] * chroma_rows)
            }
            RawLayout::Y41b => {
                strides[0] = round_up(w, 4);
                strides[1] = round_up(w, 16) / 4;
                strides[2] = strides[1];
                offsets[1] = strides[0] * h;
                offsets[2] = offsets[1] + strides[1] * h;
                plane_heights[1] = h;
                plane_heights[2] = h;
                (3, offsets[2] + strides[2] * h)
            }
            RawLayout::Y42b => {
                strides[0] = round_up(w, 4);
                strides[1] = round_up(w, 8) / 2;
                strides[2] = strides[1];
                offsets[1] = strides[0] * h;
                offsets[2] = offsets[1] + strides[1] * h;
                plane_heights[1] = h;
                plane_heights[2] = h;
                (3, offsets[2] + strides[2] * h)
            }
            RawLayout::Nv12 => {
                strides[0] = round_up(w, 4);
                strides[1] = strides[0];
                offsets[1] = strides[0] * round_up(h, 2);
                plane_heights[1] = h.div_ceil(2);
                (2, offsets[1] + strides[1] * (round_up(h, 2) / 2))
            }
            RawLayout::Nv16 => {
                strides[0] = round_up(w, 4);
                strides[1] = strides[0];
                offsets[1] = strides[0] * h;
                plane_heights[1] = h;
                (2, offsets[1] + strides[1] * h)
            }
            RawLayout::Nv24 => {
                strides[0] = round_up(w, 4);
                strides[1] = round_up(w * 2, 4);
                offsets[1] = strides[0] * h;
                plane_heights[1] = h;
                (2, offsets[1] + strides[1] * h)
            }
        };

        Self {
            layout,
            width: w,
            height: h,
            n_planes,
            strides,
            offsets,
            plane_heights,
            size,
        }
    }

    /// Pixel layout.
    pub fn layout(&self) -> RawLayout {
        self.layout
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of planes.
    pub fn n_planes(&self) -> usize {
        self.n_planes
    }

    /// Row stride of `plane` in bytes.
    pub fn stride(&self, plane: usize) -> usize {
        self.strides[plane]
    }

    /// Byte offset of `plane` from the start of the frame.
    pub fn offset(&self, plane: usize) -> usize {
        self.offsets[plane]
    }

    /// Number of rows in `plane`.
    pub fn plane_height(&self, plane: usize) -> usize {
        self.plane_heights[plane]
    }

    /// Total frame size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(481, 4), 484);
        assert_eq!(round_up(481, 16), 496);
        assert_eq!(round_up(480, 16), 480);
    }

    #[test]
    fn test_i420_geometry() {
        let info = VideoInfo::new(RawLayout::I420, 480, 270);
        assert_eq!(info.n_planes(), 3);
        assert_eq!(info.stride(0), 480);
        assert_eq!(info.stride(1), 240);
        assert_eq!(info.plane_height(1), 135);
        assert_eq!(info.offset(1), 129_600);
        assert_eq!(info.offset(2), 162_000);
        assert_eq!(info.size(), 194_400);
    }

    #[test]
    fn test_i420_odd_width() {
        let info = VideoInfo::new(RawLayout::I420, 481, 3);
        assert_eq!(info.stride(0), 484);
        assert_eq!(info.stride(1), 244);
        assert_eq!(info.plane_height(1), 2);
    }

    #[test]
    fn test_semi_planar_geometry() {
        let nv12 = VideoInfo::new(RawLayout::Nv12, 640, 480);
        assert_eq!(nv12.n_planes(), 2);
        assert_eq!(nv12.size(), 640 * 480 * 3 / 2);

        let nv16 = VideoInfo::new(RawLayout::Nv16, 640, 480);
        assert_eq!(nv16.size(), 640 * 480 * 2);

        let nv24 = VideoInfo::new(RawLayout::Nv24, 640, 480);
        assert_eq!(nv24.stride(1), 1280);
        assert_eq!(nv24.size(), 640 * 480 * 3);
    }

    #[test]
    fn test_subsampled_planar_geometry() {
        let y41b = VideoInfo::new(RawLayout::Y41b, 640, 480);
        assert_eq!(y41b.stride(1), 160);
        assert_eq!(y41b.size(), 640 * 480 + 2 * 160 * 480);

        let y42b = VideoInfo::new(RawLayout::Y42b, 640, 480);
        assert_eq!(y42b.stride(1), 320);
        assert_eq!(y42b.size(), 640 * 480 * 2);
    }
}
