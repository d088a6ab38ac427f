//! Value types exchanged with hardware components.

use crate::config::{
    ControlRate, ExposureControlMode, ExposureValue, ImageFilter, MirrorMode, WhiteBalanceMode,
};
use bytes::Bytes;
use std::fmt;

// ============================================================================
// States
// ============================================================================

/// Component state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentState {
    /// Component is in an unusable state.
    Invalid,
    /// Created, no resources allocated.
    Loaded,
    /// Resources allocated, not processing.
    Idle,
    /// Processing buffers.
    Executing,
    /// Processing suspended.
    Pause,
    /// Waiting for resources before it can become idle.
    WaitForResources,
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Invalid => "Invalid",
            Self::Loaded => "Loaded",
            Self::Idle => "Idle",
            Self::Executing => "Executing",
            Self::Pause => "Pause",
            Self::WaitForResources => "WaitForResources",
        })
    }
}

// ============================================================================
// Formats
// ============================================================================

/// Video compression format of a port.
///
/// Unknown codes are kept so that a probed format survives even when
/// nothing can be derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionFormat {
    /// Uncompressed video.
    Unused,
    /// MPEG-2.
    Mpeg2,
    /// H.263.
    H263,
    /// MPEG-4 part 2.
    Mpeg4,
    /// Windows Media Video.
    Wmv,
    /// RealVideo.
    Rv,
    /// H.264 / AVC.
    Avc,
    /// Motion JPEG.
    Mjpeg,
    /// VP6.
    Vp6,
    /// VP7.
    Vp7,
    /// VP8.
    Vp8,
    /// Sorenson.
    Sorenson,
    /// Theora.
    Theora,
    /// Unrecognized code.
    Other(u32),
}

impl CompressionFormat {
    const VENDOR_START: u32 = 0x7F00_0000;

    /// Decode a hardware code.
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Unused,
            2 => Self::Mpeg2,
            3 => Self::H263,
            4 => Self::Mpeg4,
            5 => Self::Wmv,
            6 => Self::Rv,
            7 => Self::Avc,
            8 => Self::Mjpeg,
            c if c == Self::VENDOR_START + 1 => Self::Vp6,
            c if c == Self::VENDOR_START + 2 => Self::Vp7,
            c if c == Self::VENDOR_START + 3 => Self::Vp8,
            c if c == Self::VENDOR_START + 5 => Self::Sorenson,
            c if c == Self::VENDOR_START + 6 => Self::Theora,
            other => Self::Other(other),
        }
    }

    /// Hardware code.
    pub const fn code(self) -> u32 {
        match self {
            Self::Unused => 0,
            Self::Mpeg2 => 2,
            Self::H263 => 3,
            Self::Mpeg4 => 4,
            Self::Wmv => 5,
            Self::Rv => 6,
            Self::Avc => 7,
            Self::Mjpeg => 8,
            Self::Vp6 => Self::VENDOR_START + 1,
            Self::Vp7 => Self::VENDOR_START + 2,
            Self::Vp8 => Self::VENDOR_START + 3,
            Self::Sorenson => Self::VENDOR_START + 5,
            Self::Theora => Self::VENDOR_START + 6,
            Self::Other(code) => code,
        }
    }

    /// Check if this describes uncompressed output.
    pub const fn is_raw(self) -> bool {
        matches!(self, Self::Unused)
    }
}

/// Color format of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    /// No color format (compressed ports).
    Unused,
    /// Planar YUV 4:1:1.
    Yuv411Planar,
    /// Packed planar YUV 4:1:1.
    Yuv411PackedPlanar,
    /// Planar YUV 4:2:0.
    Yuv420Planar,
    /// Packed planar YUV 4:2:0.
    Yuv420PackedPlanar,
    /// Semi-planar YUV 4:2:0.
    Yuv420SemiPlanar,
    /// Planar YUV 4:2:2.
    Yuv422Planar,
    /// Packed planar YUV 4:2:2.
    Yuv422PackedPlanar,
    /// Semi-planar YUV 4:2:2.
    Yuv422SemiPlanar,
    /// Interleaved YUV 4:4:4.
    Yuv444Interleaved,
    /// Packed semi-planar YUV 4:2:0.
    Yuv420PackedSemiPlanar,
    /// Packed semi-planar YUV 4:2:2.
    Yuv422PackedSemiPlanar,
    /// Packed planar YVU 4:2:0.
    Yvu420PackedPlanar,
    /// Packed semi-planar YVU 4:2:0.
    Yvu420PackedSemiPlanar,
    /// Unrecognized code.
    Other(u32),
}

impl ColorFormat {
    const VENDOR_START: u32 = 0x7F00_0000;

    /// Decode a hardware code.
    pub const fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Unused,
            17 => Self::Yuv411Planar,
            18 => Self::Yuv411PackedPlanar,
            19 => Self::Yuv420Planar,
            20 => Self::Yuv420PackedPlanar,
            21 => Self::Yuv420SemiPlanar,
            22 => Self::Yuv422Planar,
            23 => Self::Yuv422PackedPlanar,
            24 => Self::Yuv422SemiPlanar,
            29 => Self::Yuv444Interleaved,
            39 => Self::Yuv420PackedSemiPlanar,
            40 => Self::Yuv422PackedSemiPlanar,
            c if c == Self::VENDOR_START + 7 => Self::Yvu420PackedPlanar,
            c if c == Self::VENDOR_START + 8 => Self::Yvu420PackedSemiPlanar,
            other => Self::Other(other),
        }
    }

    /// Hardware code.
    pub const fn code(self) -> u32 {
        match self {
            Self::Unused => 0,
            Self::Yuv411Planar => 17,
            Self::Yuv411PackedPlanar => 18,
            Self::Yuv420Planar => 19,
            Self::Yuv420PackedPlanar => 20,
            Self::Yuv420SemiPlanar => 21,
            Self::Yuv422Planar => 22,
            Self::Yuv422PackedPlanar => 23,
            Self::Yuv422SemiPlanar => 24,
            Self::Yuv444Interleaved => 29,
            Self::Yuv420PackedSemiPlanar => 39,
            Self::Yuv422PackedSemiPlanar => 40,
            Self::Yvu420PackedPlanar => Self::VENDOR_START + 7,
            Self::Yvu420PackedSemiPlanar => Self::VENDOR_START + 8,
            Self::Other(code) => code,
        }
    }

    /// Check if buffers of this format carry stride/slice-padded planes.
    pub const fn is_packed(self) -> bool {
        matches!(
            self,
            Self::Yuv411PackedPlanar
                | Self::Yuv420PackedPlanar
                | Self::Yuv422PackedPlanar
                | Self::Yuv420PackedSemiPlanar
                | Self::Yuv422PackedSemiPlanar
                | Self::Yvu420PackedPlanar
                | Self::Yvu420PackedSemiPlanar
        )
    }
}

// ============================================================================
// Buffers
// ============================================================================

/// Flags carried by a hardware buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct IlBufferFlags(u32);

impl IlBufferFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Last buffer of the stream.
    pub const EOS: Self = Self(0x01);
    /// Buffer carries the stream start time.
    pub const STARTTIME: Self = Self(0x02);
    /// Decode but do not render.
    pub const DECODEONLY: Self = Self(0x04);
    /// Buffer content is corrupt.
    pub const DATACORRUPT: Self = Self(0x08);
    /// Buffer is the last fragment of a frame.
    pub const ENDOFFRAME: Self = Self(0x10);
    /// Buffer starts a sync point.
    pub const SYNCFRAME: Self = Self(0x20);
    /// Buffer carries codec configuration.
    pub const CODECCONFIG: Self = Self(0x80);

    /// Create from raw bits.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if a flag is set.
    #[inline]
    pub const fn contains(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }

    /// Combine flags using bitwise OR.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for IlBufferFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// A buffer acquired from a hardware output port.
///
/// Valid data lives in `data[offset..offset + filled_len]`.
#[derive(Debug, Clone)]
pub struct IlBuffer {
    /// Identifier of the buffer within its port.
    pub id: u32,
    /// Backing memory.
    pub data: Bytes,
    /// Start of valid data.
    pub offset: usize,
    /// Length of valid data.
    pub filled_len: usize,
    /// Buffer flags.
    pub flags: IlBufferFlags,
}

impl IlBuffer {
    /// Create a buffer whose whole payload is valid.
    pub fn new(id: u32, data: impl Into<Bytes>, flags: IlBufferFlags) -> Self {
        let data = data.into();
        Self {
            id,
            filled_len: data.len(),
            data,
            offset: 0,
            flags,
        }
    }

    /// Valid payload, clamped to the backing memory.
    pub fn payload(&self) -> &[u8] {
        let start = self.offset.min(self.data.len());
        let end = self.offset.saturating_add(self.filled_len).min(self.data.len());
        &self.data[start..end]
    }
}

/// Outcome of acquiring a buffer from an output port.
#[derive(Debug)]
pub enum Acquire {
    /// A buffer with data.
    Buffer(IlBuffer),
    /// The port is flushing.
    Flushing,
    /// The port needs reconfiguration.
    Reconfigure,
    /// End of stream.
    Eos,
    /// The component reported an error.
    Error,
}

// ============================================================================
// Parameters and configs
// ============================================================================

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Input port.
    Input,
    /// Output port.
    Output,
}

/// Video part of a port definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoPortDefinition {
    /// Frame width in pixels.
    pub frame_width: u32,
    /// Frame height in rows.
    pub frame_height: u32,
    /// Row stride in bytes.
    pub stride: i32,
    /// Rows per buffer.
    pub slice_height: u32,
    /// Bitrate in bits per second (compressed ports).
    pub bitrate: u32,
    /// Frame rate in Q16.
    pub framerate_q16: u32,
    /// Compression format.
    pub compression: CompressionFormat,
    /// Color format.
    pub color: ColorFormat,
}

impl Default for VideoPortDefinition {
    fn default() -> Self {
        Self {
            frame_width: 0,
            frame_height: 0,
            stride: 0,
            slice_height: 0,
            bitrate: 0,
            framerate_q16: 0,
            compression: CompressionFormat::Unused,
            color: ColorFormat::Unused,
        }
    }
}

/// Port definition parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDefinition {
    /// Port index.
    pub port: u32,
    /// Direction.
    pub direction: PortDirection,
    /// Whether the port is enabled.
    pub enabled: bool,
    /// Number of buffers in use.
    pub buffer_count_actual: u32,
    /// Minimum number of buffers.
    pub buffer_count_min: u32,
    /// Size of each buffer in bytes.
    pub buffer_size: u32,
    /// Required buffer alignment; zero when unconstrained.
    pub buffer_alignment: u32,
    /// Video format.
    pub video: VideoPortDefinition,
}

impl PortDefinition {
    /// Definition of an unconfigured port.
    pub fn new(port: u32, direction: PortDirection) -> Self {
        Self {
            port,
            direction,
            enabled: true,
            buffer_count_actual: 1,
            buffer_count_min: 1,
            buffer_size: 0,
            buffer_alignment: 0,
            video: VideoPortDefinition::default(),
        }
    }
}

/// One entry of a port's supported-format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoPortFormat {
    /// Port index.
    pub port: u32,
    /// Enumeration index.
    pub index: u32,
    /// Compression format.
    pub compression: CompressionFormat,
    /// Color format.
    pub color: ColorFormat,
}

/// Range of video ports exposed by a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    /// Number of ports.
    pub count: u32,
    /// Index of the first port.
    pub start: u32,
}

/// Key selecting a parameter to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// Port definition of a port.
    PortDefinition {
        /// Port index.
        port: u32,
    },
    /// Supported format number `index` of a port.
    VideoPortFormat {
        /// Port index.
        port: u32,
        /// Enumeration index.
        index: u32,
    },
    /// Range of video ports.
    VideoInit,
    /// Bitrate control of a port.
    VideoBitrate {
        /// Port index.
        port: u32,
    },
    /// Camera device number.
    CameraDeviceNumber,
}

/// A parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Port definition.
    PortDefinition(PortDefinition),
    /// Port format.
    VideoPortFormat(VideoPortFormat),
    /// Range of video ports.
    VideoInit(PortRange),
    /// Bitrate control.
    VideoBitrate {
        /// Port index.
        port: u32,
        /// Rate control mode.
        control_rate: ControlRate,
        /// Target bitrate in bits per second.
        target_bitrate: u32,
    },
    /// Camera device number.
    CameraDeviceNumber(u32),
}

impl Param {
    /// Key under which this parameter is stored.
    pub fn key(&self) -> ParamKey {
        match self {
            Self::PortDefinition(def) => ParamKey::PortDefinition { port: def.port },
            Self::VideoPortFormat(fmt) => ParamKey::VideoPortFormat {
                port: fmt.port,
                index: fmt.index,
            },
            Self::VideoInit(_) => ParamKey::VideoInit,
            Self::VideoBitrate { port, .. } => ParamKey::VideoBitrate { port: *port },
            Self::CameraDeviceNumber(_) => ParamKey::CameraDeviceNumber,
        }
    }
}

/// Key selecting a config to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// Image sharpness.
    Sharpness,
    /// Gamma.
    Gamma,
    /// Contrast.
    Contrast,
    /// Brightness.
    Brightness,
    /// Saturation.
    Saturation,
    /// Image filter.
    ImageFilter,
    /// Color enhancement.
    ColorEnhancement,
    /// White balance.
    WhiteBalance,
    /// Exposure control mode.
    ExposureControl,
    /// Exposure value settings.
    ExposureValue,
    /// Frame stabilisation.
    FrameStabilisation,
    /// Mirroring of a port.
    Mirror {
        /// Port index.
        port: u32,
    },
    /// Encode frame rate of a port.
    FrameRate {
        /// Port index.
        port: u32,
    },
    /// Capture toggle of a port.
    Capturing {
        /// Port index.
        port: u32,
    },
}

/// A config value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Config {
    /// Image sharpness.
    Sharpness(i32),
    /// Gamma in Q16.
    Gamma(i32),
    /// Contrast.
    Contrast(i32),
    /// Brightness.
    Brightness(u32),
    /// Saturation.
    Saturation(i32),
    /// Image filter.
    ImageFilter(ImageFilter),
    /// Color enhancement.
    ColorEnhancement {
        /// Whether enhancement is applied.
        enabled: bool,
        /// Customized U channel.
        u: u8,
        /// Customized V channel.
        v: u8,
    },
    /// White balance.
    WhiteBalance(WhiteBalanceMode),
    /// Exposure control mode.
    ExposureControl(ExposureControlMode),
    /// Exposure value settings.
    ExposureValue(ExposureValue),
    /// Frame stabilisation.
    FrameStabilisation(bool),
    /// Mirroring of a port.
    Mirror {
        /// Port index.
        port: u32,
        /// Mirror mode.
        mode: MirrorMode,
    },
    /// Encode frame rate of a port.
    FrameRate {
        /// Port index.
        port: u32,
        /// Frame rate in Q16.
        q16: u32,
    },
    /// Capture toggle of a port.
    Capturing {
        /// Port index.
        port: u32,
        /// Whether capture is enabled.
        enabled: bool,
    },
}

impl Config {
    /// Key under which this config is stored.
    pub fn key(&self) -> ConfigKey {
        match self {
            Self::Sharpness(_) => ConfigKey::Sharpness,
            Self::Gamma(_) => ConfigKey::Gamma,
            Self::Contrast(_) => ConfigKey::Contrast,
            Self::Brightness(_) => ConfigKey::Brightness,
            Self::Saturation(_) => ConfigKey::Saturation,
            Self::ImageFilter(_) => ConfigKey::ImageFilter,
            Self::ColorEnhancement { .. } => ConfigKey::ColorEnhancement,
            Self::WhiteBalance(_) => ConfigKey::WhiteBalance,
            Self::ExposureControl(_) => ConfigKey::ExposureControl,
            Self::ExposureValue(_) => ConfigKey::ExposureValue,
            Self::FrameStabilisation(_) => ConfigKey::FrameStabilisation,
            Self::Mirror { port, .. } => ConfigKey::Mirror { port: *port },
            Self::FrameRate { port, .. } => ConfigKey::FrameRate { port: *port },
            Self::Capturing { port, .. } => ConfigKey::Capturing { port: *port },
        }
    }
}
