//! Enumeration of the formats a hardware port supports.
//!
//! Each supported (compression, color) pair becomes a
//! [`PortFormatDescriptor`] with a capability template derived from the
//! hardware target's static bounds. Probing is done once per port and
//! cached until the source stops.

use crate::config::HardwareTarget;
use crate::format::{MediaKind, RawLayout, VideoCaps};
use crate::il::{ColorFormat, CompressionFormat, IlComponent, IlError, Param, ParamKey};
use std::collections::HashMap;
use std::sync::Arc;

/// One format supported by a hardware port.
#[derive(Debug, Clone, PartialEq)]
pub struct PortFormatDescriptor {
    /// Compression format.
    pub compression: CompressionFormat,
    /// Color format.
    pub color: ColorFormat,
    /// Whether buffers carry stride and slice padded planes.
    pub is_packed: bool,
    /// Capabilities this format can produce. `None` when nothing could be
    /// derived: the descriptor is kept but never matches in negotiation.
    pub template: Option<VideoCaps>,
}

impl PortFormatDescriptor {
    /// Describe (`compression`, `color`) on `target`.
    pub fn new(target: HardwareTarget, compression: CompressionFormat, color: ColorFormat) -> Self {
        Self {
            compression,
            color,
            is_packed: color.is_packed(),
            template: template_for(target, compression, color),
        }
    }

    /// Check if this format delivers uncompressed frames.
    pub fn is_raw(&self) -> bool {
        self.compression.is_raw()
    }

    /// Raw layout of the template, if fixed.
    pub fn raw_layout(&self) -> Option<RawLayout> {
        self.template
            .as_ref()
            .and_then(|t| t.layout.as_fixed().copied())
    }
}

/// Raw layout produced by a color format.
pub fn raw_layout(color: ColorFormat) -> Option<RawLayout> {
    use ColorFormat as C;
    match color {
        C::Yuv411Planar | C::Yuv411PackedPlanar => Some(RawLayout::Y41b),
        C::Yuv420Planar | C::Yuv420PackedPlanar => Some(RawLayout::I420),
        C::Yuv420SemiPlanar | C::Yuv420PackedSemiPlanar => Some(RawLayout::Nv12),
        C::Yuv422Planar | C::Yuv422PackedPlanar => Some(RawLayout::Y42b),
        C::Yuv422SemiPlanar | C::Yuv422PackedSemiPlanar => Some(RawLayout::Nv16),
        C::Yuv444Interleaved => Some(RawLayout::Nv24),
        _ => None,
    }
}

fn template_for(
    target: HardwareTarget,
    compression: CompressionFormat,
    color: ColorFormat,
) -> Option<VideoCaps> {
    use CompressionFormat as F;

    if target.is_blacklisted(compression) {
        return None;
    }
    let caps = match compression {
        F::Unused => VideoCaps::raw(raw_layout(color)?),
        F::Mpeg2 => VideoCaps::new(MediaKind::Mpeg).with_mpeg_version(2),
        F::H263 => VideoCaps::new(MediaKind::H263),
        F::Mpeg4 => VideoCaps::new(MediaKind::Mpeg).with_mpeg_version(4),
        F::Wmv => VideoCaps::new(MediaKind::Wmv),
        F::Rv => VideoCaps::new(MediaKind::RealVideo),
        F::Avc => VideoCaps::new(MediaKind::H264),
        F::Mjpeg => VideoCaps::new(MediaKind::Jpeg),
        F::Vp6 => VideoCaps::new(MediaKind::Vp6),
        F::Vp7 => VideoCaps::new(MediaKind::Vp7),
        F::Vp8 => VideoCaps::new(MediaKind::Vp8),
        F::Sorenson => VideoCaps::new(MediaKind::Svq),
        F::Theora => VideoCaps::new(MediaKind::Theora),
        F::Other(_) => return None,
    };
    let (min_w, max_w) = target.width_range();
    let (min_h, max_h) = target.height_range();
    let (min_fps, max_fps) = target.framerate_range();
    Some(
        caps.with_size_range(min_w, max_w, min_h, max_h)
            .with_framerate_range(min_fps, max_fps),
    )
}

/// Cached format enumeration per (component, port).
#[derive(Debug)]
pub struct PortFormatCatalog {
    target: HardwareTarget,
    cache: HashMap<(String, u32), Arc<[PortFormatDescriptor]>>,
}

impl PortFormatCatalog {
    /// Empty catalog for `target`.
    pub fn new(target: HardwareTarget) -> Self {
        Self {
            target,
            cache: HashMap::new(),
        }
    }

    /// Formats supported by `port` of `component`, in hardware order.
    ///
    /// The first non-empty result is cached: later calls return the same
    /// allocation without querying the hardware. An enumeration error other
    /// than the end marker discards everything found so far.
    pub fn probe(&mut self, component: &dyn IlComponent, port: u32) -> Arc<[PortFormatDescriptor]> {
        let key = (component.name().to_string(), port);
        if let Some(cached) = self.cache.get(&key) {
            return Arc::clone(cached);
        }

        let mut found = Vec::new();
        for index in 0.. {
            match component.get_parameter(ParamKey::VideoPortFormat { port, index }) {
                Ok(Param::VideoPortFormat(format)) => {
                    let descriptor =
                        PortFormatDescriptor::new(self.target, format.compression, format.color);
                    tracing::debug!(
                        component = component.name(),
                        port,
                        index,
                        compression = ?descriptor.compression,
                        color = ?descriptor.color,
                        template = ?descriptor.template.as_ref().map(ToString::to_string),
                        "probed port format"
                    );
                    found.push(descriptor);
                }
                Ok(_) => {
                    tracing::warn!(component = component.name(), port, "unexpected parameter type");
                    return Arc::from(Vec::new());
                }
                Err(IlError::NoMore) => break,
                Err(err) => {
                    tracing::error!(
                        component = component.name(),
                        port,
                        error = %err,
                        "failed to get video port format"
                    );
                    return Arc::from(Vec::new());
                }
            }
        }

        let descriptors: Arc<[PortFormatDescriptor]> = Arc::from(found);
        if !descriptors.is_empty() {
            self.cache.insert(key, Arc::clone(&descriptors));
        }
        descriptors
    }

    /// Forget every cached enumeration.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Check if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
