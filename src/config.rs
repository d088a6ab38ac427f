//! Camera tuning and source configuration.
//!
//! [`CameraConfiguration`] holds the tuning knobs pushed to the camera at
//! `start()`. Each enumerated knob is a plain enum carrying its hardware
//! value, a human label and a short tag (`nick`) usable as a property
//! string. [`SourceSettings`] bundles the configuration with the hardware
//! target and component names.
//!
//! ```rust
//! use omxcamsrc::config::{CameraConfiguration, HardwareTarget, MirrorMode, WhiteBalanceMode};
//!
//! let mut config = CameraConfiguration::for_target(HardwareTarget::RaspberryPi);
//! config.set_white_balance(WhiteBalanceMode::from_nick("cloudy").unwrap());
//! config.set_horizontal_flip(true);
//! assert_eq!(config.mirror(), MirrorMode::Horizontal);
//! assert!(config.set_contrast(150).is_err());
//! ```

use crate::error::{Error, Result};
use crate::format::Framerate;

// ============================================================================
// Tunable enums
// ============================================================================

macro_rules! tunable_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident = $value:expr, $label:literal, $nick:literal $(, $ext:ident)? ; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[doc = $label]
                $variant,
            )*
        }

        impl $name {
            const TABLE: &'static [($name, u32, &'static str, &'static str, bool)] = &[
                $( ($name::$variant, $value, $label, $nick, tunable_enum!(@ext $($ext)?)), )*
            ];

            fn entry(self) -> &'static ($name, u32, &'static str, &'static str, bool) {
                // TABLE lists every variant in declaration order.
                &Self::TABLE[self as usize]
            }

            /// Hardware value.
            pub fn value(self) -> u32 {
                self.entry().1
            }

            /// Human readable description.
            pub fn label(self) -> &'static str {
                self.entry().2
            }

            /// Short tag.
            pub fn nick(self) -> &'static str {
                self.entry().3
            }

            /// Look up a value by its short tag.
            pub fn from_nick(nick: &str) -> Option<Self> {
                Self::TABLE.iter().find(|e| e.3 == nick).map(|e| e.0)
            }

            /// Look up a value by its hardware value.
            pub fn from_value(value: u32) -> Option<Self> {
                Self::TABLE.iter().find(|e| e.1 == value).map(|e| e.0)
            }

            /// Values available on `target`, in declaration order.
            pub fn all(target: HardwareTarget) -> Vec<Self> {
                Self::TABLE
                    .iter()
                    .filter(|e| !e.4 || target.is_extended())
                    .map(|e| e.0)
                    .collect()
            }

            /// Check if the value exists on `target`.
            pub fn is_available(self, target: HardwareTarget) -> bool {
                !self.entry().4 || target.is_extended()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.nick())
            }
        }
    };
    (@ext extended) => { true };
    (@ext) => { false };
}

const VENDOR: u32 = 0x7F00_0000;

tunable_enum! {
    /// Image effect applied by the camera.
    ImageFilter {
        None = 0, "Disable image filtering", "none";
        Denoise = 1, "Remove noise from the image", "denoise";
        Emboss = 2, "Embossed effect", "emboss";
        Negative = 3, "Negate image colors", "negative";
        Sketch = 4, "Sketching effect", "sketch";
        OilPaint = 5, "Oil painting effect", "oilpaint";
        Hatch = 6, "Grainy material effect", "hatch";
        Gpen = 7, "Graphite pen drawing style effect", "gpen";
        Antialias = 8, "Anti-alias pixels in the image", "antialias";
        DeRing = 9, "Remove digital image processing artifacts in the image", "dering";
        Solarize = 10, "Solarization effect", "solarize";
        Watercolor = VENDOR, "Water color painting effect", "watercolor", extended;
        Pastel = VENDOR + 1, "Create a pastel effect", "pastel", extended;
        Sharpen = VENDOR + 2, "Sharpen the image", "sharpen", extended;
        Film = VENDOR + 3, "Grainy old film effect", "film", extended;
        Blur = VENDOR + 4, "Blur the image", "blur", extended;
        Saturation = VENDOR + 5, "Color-saturate the image", "color-saturate", extended;
        ColourSwap = VENDOR + 8, "Swap colors on the image", "color-swap", extended;
        WashedOut = VENDOR + 9, "Washed-out effect", "washedout", extended;
        ColourPoint = VENDOR + 0x0A, "Color-point effect", "color-point", extended;
        Posterise = VENDOR + 0x0B, "Poster effect", "poster", extended;
        ColourBalance = VENDOR + 0x0C, "Color-balance effect", "color-balance", extended;
        Cartoon = VENDOR + 0x0D, "Cartoon effect", "cartoon", extended;
    }
}

tunable_enum! {
    /// White balance control.
    WhiteBalanceMode {
        Off = 0, "Disables white balance calculation", "off";
        Auto = 1, "Automatic white balance control", "auto";
        SunLight = 2, "Manual white balance control with clear sun light", "sun";
        Cloudy = 3, "Manual white balance control with sun light through clouds", "cloudy";
        Shade = 4, "Manual white balance control with sun light in shade", "shade";
        Tungsten = 5, "Manual white balance control with tungsten light", "tungsten";
        Fluorescent = 6, "Manual white balance control with fluorescent light", "fluorescent";
        Incandescent = 7, "Manual white balance control with incandescent light", "incandescent";
        Flash = 8, "Manual white balance control when the light source is a flash", "flash";
        Horizon = 9, "Manual white balance control with sun light when the sun is on the horizon", "horizon";
    }
}

tunable_enum! {
    /// Exposure control mode.
    ExposureControlMode {
        Off = 0, "Disables exposure control", "off";
        Auto = 1, "Automatic exposure", "auto";
        Night = 2, "Exposure at night", "night";
        BackLight = 3, "Exposure with backlight illuminating the subject", "backlight";
        SpotLight = 4, "Exposure with a spotlight illuminating the subject", "spotlight";
        Sports = 5, "Exposure for sports or other fast movement", "sports";
        Snow = 6, "Exposure for the subject in snow", "snow";
        Beach = 7, "Exposure for the subject at a beach", "beach";
        LargeAperture = 8, "Exposure when using a large aperture on the camera", "large-aperture";
        SmallAperture = 9, "Exposure when using a small aperture on the camera", "small-aperture";
        VeryLong = VENDOR, "Very long exposure", "long", extended;
        FixedFps = VENDOR + 1, "Constrain frames-per-second to a fixed value", "fixedfps", extended;
        Antishake = VENDOR + 3, "Anti-shake mode", "antishake", extended;
        Fireworks = VENDOR + 4, "Exposure for fireworks", "fireworks", extended;
    }
}

tunable_enum! {
    /// Exposure metering mode.
    ExposureMeteringMode {
        Average = 0, "Center weight average metering", "average";
        Spot = 1, "Spot (partial) metering", "spot";
        Matrix = 2, "Matrix or evaluative metering", "matrix";
    }
}

tunable_enum! {
    /// Encoder rate control.
    ControlRate {
        Disable = 0, "Disable", "disable";
        Variable = 1, "Variable", "variable";
        Constant = 2, "Constant", "constant";
        VariableSkipFrames = 3, "Variable Skip Frames", "variable-skip-frames";
        ConstantSkipFrames = 4, "Constant Skip Frames", "constant-skip-frames";
    }
}

/// Mirroring applied to camera output ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MirrorMode {
    /// No mirroring.
    #[default]
    None,
    /// Flip around the horizontal axis.
    Vertical,
    /// Flip around the vertical axis.
    Horizontal,
    /// Both flips.
    Both,
}

impl MirrorMode {
    /// Mirror mode for a pair of flip flags.
    pub const fn from_flips(horizontal: bool, vertical: bool) -> Self {
        match (horizontal, vertical) {
            (false, false) => Self::None,
            (true, false) => Self::Horizontal,
            (false, true) => Self::Vertical,
            (true, true) => Self::Both,
        }
    }

    /// Hardware value.
    pub const fn value(self) -> u32 {
        self as u32
    }
}

// ============================================================================
// Hardware target
// ============================================================================

/// Capability set of the hardware the source runs on.
///
/// The extended target chains an encoder after the camera video output and
/// absorbs the preview output into a null sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HardwareTarget {
    /// Camera component only.
    #[default]
    Generic,
    /// Camera with null sink and encoder chain.
    RaspberryPi,
}

/// Name of the null sink component on the extended target.
pub const NULL_SINK_COMPONENT: &str = "OMX.broadcom.null_sink";
/// Name of the encoder component on the extended target.
pub const ENCODER_COMPONENT: &str = "OMX.broadcom.video_encode";

impl HardwareTarget {
    /// Check if the encoder and null sink chain is available.
    pub const fn is_extended(self) -> bool {
        matches!(self, Self::RaspberryPi)
    }

    /// Compression formats known not to work on this target.
    pub fn is_blacklisted(self, compression: crate::il::CompressionFormat) -> bool {
        use crate::il::CompressionFormat as C;
        match self {
            Self::Generic => false,
            Self::RaspberryPi => matches!(compression, C::Mjpeg | C::Mpeg4 | C::H263 | C::Vp7),
        }
    }

    /// Width bounds of derived capability templates.
    pub const fn width_range(self) -> (u32, u32) {
        match self {
            Self::Generic => (0, i32::MAX as u32),
            Self::RaspberryPi => (64, 1920),
        }
    }

    /// Height bounds of derived capability templates.
    pub const fn height_range(self) -> (u32, u32) {
        match self {
            Self::Generic => (0, i32::MAX as u32),
            Self::RaspberryPi => (64, 1080),
        }
    }

    /// Frame-rate bounds of derived capability templates.
    pub const fn framerate_range(self) -> (Framerate, Framerate) {
        match self {
            Self::Generic => (Framerate::new(0, 1), Framerate::new(i32::MAX as u32, 1)),
            Self::RaspberryPi => (Framerate::new(2, 1), Framerate::new(30, 1)),
        }
    }

    /// Format chosen by `fixate` when the caps leave a choice.
    pub const fn fixate_defaults(self) -> FixateDefaults {
        match self {
            Self::Generic => FixateDefaults {
                width: 320,
                height: 240,
                framerate: Framerate::FPS_30,
            },
            Self::RaspberryPi => FixateDefaults {
                width: 480,
                height: 270,
                framerate: Framerate::FPS_25,
            },
        }
    }
}

/// Preferred values for fixation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixateDefaults {
    /// Preferred width.
    pub width: u32,
    /// Preferred height.
    pub height: u32,
    /// Preferred frame rate.
    pub framerate: Framerate,
}

// ============================================================================
// Camera configuration
// ============================================================================

/// Exposure settings pushed as one config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureValue {
    /// Metering mode.
    pub metering: ExposureMeteringMode,
    /// EV compensation.
    pub ev_compensation: i32,
    /// Let the camera pick the ISO sensitivity.
    pub auto_sensitivity: bool,
    /// ISO sensitivity when not automatic.
    pub sensitivity: u32,
    /// Let the camera pick the aperture.
    pub auto_aperture: bool,
    /// Aperture f-number when not automatic.
    pub aperture: u32,
}

impl Default for ExposureValue {
    fn default() -> Self {
        Self {
            metering: ExposureMeteringMode::Spot,
            ev_compensation: 0,
            auto_sensitivity: true,
            sensitivity: 100,
            auto_aperture: true,
            aperture: 2,
        }
    }
}

/// Color enhancement settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorEnhancement {
    /// Whether enhancement is applied.
    pub enabled: bool,
    /// Customized U channel.
    pub u: u8,
    /// Customized V channel.
    pub v: u8,
}

/// Gamma reported while the sensor default is in effect.
pub const GAMMA_DEFAULT: u32 = 2;
/// Maximum encoder target bitrate.
pub const TARGET_BITRATE_MAX: u32 = 17_000_000;

fn check_range<T: PartialOrd + std::fmt::Display>(
    name: &'static str,
    value: T,
    min: T,
    max: T,
) -> Result<T> {
    if value < min || value > max {
        return Err(Error::invalid_property(
            name,
            format!("{value} outside [{min}, {max}]"),
        ));
    }
    Ok(value)
}

/// Camera tuning knobs.
///
/// Values are consumed when the camera is configured at `start()`.
/// Setters reject out-of-range values and values that do not exist on the
/// configured target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfiguration {
    target: HardwareTarget,
    device_number: u32,
    sharpness: i32,
    gamma: Option<u32>,
    contrast: i32,
    brightness: u32,
    saturation: i32,
    image_filter: ImageFilter,
    color_enhancement: ColorEnhancement,
    white_balance: WhiteBalanceMode,
    exposure_control: ExposureControlMode,
    exposure: ExposureValue,
    frame_stabilisation: bool,
    horizontal_flip: bool,
    vertical_flip: bool,
    mirror: MirrorMode,
    control_rate: ControlRate,
    target_bitrate: u32,
}

impl Default for CameraConfiguration {
    fn default() -> Self {
        Self::for_target(HardwareTarget::Generic)
    }
}

impl CameraConfiguration {
    /// Defaults for `target`.
    pub fn for_target(target: HardwareTarget) -> Self {
        Self {
            target,
            device_number: 0,
            sharpness: 0,
            gamma: None,
            contrast: 0,
            brightness: 50,
            saturation: 0,
            image_filter: ImageFilter::None,
            color_enhancement: ColorEnhancement::default(),
            white_balance: WhiteBalanceMode::Auto,
            exposure_control: ExposureControlMode::Auto,
            exposure: ExposureValue::default(),
            frame_stabilisation: true,
            horizontal_flip: false,
            vertical_flip: false,
            mirror: MirrorMode::None,
            control_rate: ControlRate::Variable,
            target_bitrate: TARGET_BITRATE_MAX,
        }
    }

    /// Target the values are validated against.
    pub fn target(&self) -> HardwareTarget {
        self.target
    }

    pub(crate) fn retarget(&mut self, target: HardwareTarget) {
        self.target = target;
    }

    fn require_extended(&self, name: &'static str) -> Result<()> {
        if self.target.is_extended() {
            Ok(())
        } else {
            Err(Error::invalid_property(name, "not available on this target"))
        }
    }

    /// Camera device number.
    pub fn device_number(&self) -> u32 {
        self.device_number
    }

    /// Select the camera device.
    pub fn set_device_number(&mut self, device: u32) -> Result<()> {
        self.device_number = check_range("device-number", device, 0, i32::MAX as u32)?;
        Ok(())
    }

    /// Image sharpness (extended target).
    pub fn sharpness(&self) -> i32 {
        self.sharpness
    }

    /// Set image sharpness, -100 to 100.
    pub fn set_sharpness(&mut self, sharpness: i32) -> Result<()> {
        self.require_extended("sharpness")?;
        self.sharpness = check_range("sharpness", sharpness, -100, 100)?;
        Ok(())
    }

    /// Gamma, 0 to 4.
    pub fn gamma(&self) -> u32 {
        self.gamma.unwrap_or(GAMMA_DEFAULT)
    }

    /// Gamma in Q16 as pushed to the camera; `None` keeps the sensor default.
    pub fn gamma_q16(&self) -> Option<i32> {
        self.gamma.filter(|&g| g != 0).map(|g| (g as i32) << 16)
    }

    /// Set gamma, 0 to 4.
    pub fn set_gamma(&mut self, gamma: u32) -> Result<()> {
        self.gamma = Some(check_range("gamma", gamma, 0, 4)?);
        Ok(())
    }

    /// Contrast.
    pub fn contrast(&self) -> i32 {
        self.contrast
    }

    /// Set contrast, -100 to 100.
    pub fn set_contrast(&mut self, contrast: i32) -> Result<()> {
        self.contrast = check_range("contrast", contrast, -100, 100)?;
        Ok(())
    }

    /// Brightness.
    pub fn brightness(&self) -> u32 {
        self.brightness
    }

    /// Set brightness, 0 to 100.
    pub fn set_brightness(&mut self, brightness: u32) -> Result<()> {
        self.brightness = check_range("brightness", brightness, 0, 100)?;
        Ok(())
    }

    /// Saturation.
    pub fn saturation(&self) -> i32 {
        self.saturation
    }

    /// Set saturation, -100 to 100.
    pub fn set_saturation(&mut self, saturation: i32) -> Result<()> {
        self.saturation = check_range("saturation", saturation, -100, 100)?;
        Ok(())
    }

    /// Image filter.
    pub fn image_filter(&self) -> ImageFilter {
        self.image_filter
    }

    /// Set the image filter.
    pub fn set_image_filter(&mut self, filter: ImageFilter) -> Result<()> {
        if !filter.is_available(self.target) {
            return Err(Error::invalid_property(
                "image-filter",
                format!("{filter} not available on this target"),
            ));
        }
        self.image_filter = filter;
        Ok(())
    }

    /// Color enhancement.
    pub fn color_enhancement(&self) -> ColorEnhancement {
        self.color_enhancement
    }

    /// Set the U channel; enables color enhancement.
    pub fn set_color_enhancement_u(&mut self, u: u8) {
        self.color_enhancement.enabled = true;
        self.color_enhancement.u = u;
    }

    /// Set the V channel; enables color enhancement.
    pub fn set_color_enhancement_v(&mut self, v: u8) {
        self.color_enhancement.enabled = true;
        self.color_enhancement.v = v;
    }

    /// White balance mode.
    pub fn white_balance(&self) -> WhiteBalanceMode {
        self.white_balance
    }

    /// Set the white balance mode.
    pub fn set_white_balance(&mut self, mode: WhiteBalanceMode) {
        self.white_balance = mode;
    }

    /// Exposure control mode.
    pub fn exposure_control(&self) -> ExposureControlMode {
        self.exposure_control
    }

    /// Set the exposure control mode.
    pub fn set_exposure_control(&mut self, mode: ExposureControlMode) -> Result<()> {
        if !mode.is_available(self.target) {
            return Err(Error::invalid_property(
                "exposure-control-mode",
                format!("{mode} not available on this target"),
            ));
        }
        self.exposure_control = mode;
        Ok(())
    }

    /// Exposure settings as pushed to the camera.
    pub fn exposure(&self) -> ExposureValue {
        self.exposure
    }

    /// Set the metering mode.
    pub fn set_exposure_metering(&mut self, metering: ExposureMeteringMode) {
        self.exposure.metering = metering;
    }

    /// Set EV compensation, -10 to 10.
    pub fn set_ev_compensation(&mut self, ev: i32) -> Result<()> {
        self.exposure.ev_compensation = check_range("exposure-value-compensation", ev, -10, 10)?;
        Ok(())
    }

    /// ISO sensitivity, 0 while automatic.
    pub fn iso_sensitivity(&self) -> u32 {
        if self.exposure.auto_sensitivity {
            0
        } else {
            self.exposure.sensitivity
        }
    }

    /// Fix the ISO sensitivity, 100 to 800. Disables automatic sensitivity.
    pub fn set_iso_sensitivity(&mut self, iso: u32) -> Result<()> {
        self.exposure.sensitivity = check_range("exposure-iso-sensitivity", iso, 100, 800)?;
        self.exposure.auto_sensitivity = false;
        Ok(())
    }

    /// Aperture f-number, 0 while automatic.
    pub fn aperture(&self) -> u32 {
        if self.exposure.auto_aperture {
            0
        } else {
            self.exposure.aperture
        }
    }

    /// Fix the aperture, 1 to 16. Disables automatic aperture.
    pub fn set_aperture(&mut self, aperture: u32) -> Result<()> {
        self.exposure.aperture = check_range("aperture", aperture, 1, 16)?;
        self.exposure.auto_aperture = false;
        Ok(())
    }

    /// Frame stabilisation.
    pub fn frame_stabilisation(&self) -> bool {
        self.frame_stabilisation
    }

    /// Enable or disable frame stabilisation.
    pub fn set_frame_stabilisation(&mut self, enabled: bool) {
        self.frame_stabilisation = enabled;
    }

    /// Horizontal flip.
    pub fn horizontal_flip(&self) -> bool {
        self.horizontal_flip
    }

    /// Vertical flip.
    pub fn vertical_flip(&self) -> bool {
        self.vertical_flip
    }

    /// Set the horizontal flip and recompute the mirror mode.
    pub fn set_horizontal_flip(&mut self, flip: bool) {
        self.horizontal_flip = flip;
        self.mirror = MirrorMode::from_flips(self.horizontal_flip, self.vertical_flip);
    }

    /// Set the vertical flip and recompute the mirror mode.
    pub fn set_vertical_flip(&mut self, flip: bool) {
        self.vertical_flip = flip;
        self.mirror = MirrorMode::from_flips(self.horizontal_flip, self.vertical_flip);
    }

    /// Mirror mode derived from the flips.
    pub fn mirror(&self) -> MirrorMode {
        self.mirror
    }

    /// Encoder rate control (extended target).
    pub fn control_rate(&self) -> ControlRate {
        self.control_rate
    }

    /// Set the encoder rate control.
    pub fn set_control_rate(&mut self, rate: ControlRate) -> Result<()> {
        self.require_extended("control-rate")?;
        self.control_rate = rate;
        Ok(())
    }

    /// Encoder target bitrate (extended target).
    pub fn target_bitrate(&self) -> u32 {
        self.target_bitrate
    }

    /// Set the encoder target bitrate, up to 17 Mbit/s.
    pub fn set_target_bitrate(&mut self, bitrate: u32) -> Result<()> {
        self.require_extended("target-bitrate")?;
        self.target_bitrate = check_range("target-bitrate", bitrate, 0, TARGET_BITRATE_MAX)?;
        Ok(())
    }
}

// ============================================================================
// Component and source settings
// ============================================================================

/// Where to find the camera component and its ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentConfig {
    /// Library providing the components.
    pub core_name: String,
    /// Camera component name.
    pub component_name: String,
    /// Optional component role.
    pub component_role: Option<String>,
    /// Camera input port index.
    pub in_port_index: u32,
    /// Camera video output port index.
    pub out_port_index: u32,
}

impl ComponentConfig {
    /// Create a configuration for `component_name` in `core_name`.
    pub fn new(core_name: impl Into<String>, component_name: impl Into<String>) -> Self {
        Self {
            core_name: core_name.into(),
            component_name: component_name.into(),
            component_role: None,
            in_port_index: 0,
            out_port_index: 1,
        }
    }

    /// Set the port indices.
    pub fn with_ports(mut self, in_port: u32, out_port: u32) -> Self {
        self.in_port_index = in_port;
        self.out_port_index = out_port;
        self
    }

    /// Set the component role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.component_role = Some(role.into());
        self
    }

    /// Broadcom camera on a Raspberry Pi.
    pub fn raspberry_pi() -> Self {
        Self::new("/opt/vc/lib/libopenmaxil.so", "OMX.broadcom.camera").with_ports(73, 71)
    }
}

/// Everything needed to construct a camera source.
///
/// ```rust
/// use omxcamsrc::config::{HardwareTarget, SourceSettings};
///
/// let settings = SourceSettings::raspberry_pi().with_fixate_defaults(640, 480, 30, 1);
/// assert_eq!(settings.target, HardwareTarget::RaspberryPi);
/// assert_eq!(settings.component.out_port_index, 71);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// Hardware capability set.
    pub target: HardwareTarget,
    /// Camera component location.
    pub component: ComponentConfig,
    /// Tuning knobs.
    pub camera: CameraConfiguration,
    /// Fixation preferences.
    pub fixate: FixateDefaults,
}

impl SourceSettings {
    /// Settings for a generic target.
    pub fn new(component: ComponentConfig) -> Self {
        let target = HardwareTarget::Generic;
        Self {
            target,
            component,
            camera: CameraConfiguration::for_target(target),
            fixate: target.fixate_defaults(),
        }
    }

    /// Settings for the Broadcom camera on a Raspberry Pi.
    pub fn raspberry_pi() -> Self {
        Self::new(ComponentConfig::raspberry_pi()).with_target(HardwareTarget::RaspberryPi)
    }

    /// Switch the hardware target. Resets fixation preferences to the
    /// target's defaults.
    pub fn with_target(mut self, target: HardwareTarget) -> Self {
        self.target = target;
        self.camera.retarget(target);
        self.fixate = target.fixate_defaults();
        self
    }

    /// Replace the tuning knobs.
    pub fn with_camera(mut self, mut camera: CameraConfiguration) -> Self {
        camera.retarget(self.target);
        self.camera = camera;
        self
    }

    /// Override fixation preferences.
    pub fn with_fixate_defaults(mut self, width: u32, height: u32, fps_n: u32, fps_d: u32) -> Self {
        self.fixate = FixateDefaults {
            width,
            height,
            framerate: Framerate::new(fps_n, fps_d),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_mode_from_flips() {
        assert_eq!(MirrorMode::from_flips(false, false), MirrorMode::None);
        assert_eq!(MirrorMode::from_flips(true, false), MirrorMode::Horizontal);
        assert_eq!(MirrorMode::from_flips(false, true), MirrorMode::Vertical);
        assert_eq!(MirrorMode::from_flips(true, true), MirrorMode::Both);
    }

    #[test]
    fn test_flip_setters_keep_mirror_in_sync() {
        let mut config = CameraConfiguration::default();
        config.set_vertical_flip(true);
        assert_eq!(config.mirror(), MirrorMode::Vertical);
        config.set_horizontal_flip(true);
        assert_eq!(config.mirror(), MirrorMode::Both);
        config.set_vertical_flip(false);
        assert_eq!(config.mirror(), MirrorMode::Horizontal);
    }

    #[test]
    fn test_defaults() {
        let config = CameraConfiguration::default();
        assert_eq!(config.brightness(), 50);
        assert_eq!(config.gamma(), GAMMA_DEFAULT);
        assert_eq!(config.gamma_q16(), None);
        assert_eq!(config.white_balance(), WhiteBalanceMode::Auto);
        assert_eq!(config.exposure().metering, ExposureMeteringMode::Spot);
        assert_eq!(config.iso_sensitivity(), 0);
        assert_eq!(config.aperture(), 0);
        assert!(config.frame_stabilisation());
    }

    #[test]
    fn test_range_checks() {
        let mut config = CameraConfiguration::default();
        assert!(config.set_contrast(-100).is_ok());
        assert!(config.set_contrast(101).is_err());
        assert!(config.set_brightness(101).is_err());
        assert!(config.set_gamma(5).is_err());
        assert!(config.set_ev_compensation(-11).is_err());
        assert!(config.set_iso_sensitivity(50).is_err());
        assert_eq!(config.iso_sensitivity(), 0);
    }

    #[test]
    fn test_gamma_pushed_as_q16() {
        let mut config = CameraConfiguration::default();
        config.set_gamma(3).unwrap();
        assert_eq!(config.gamma_q16(), Some(3 << 16));
        config.set_gamma(0).unwrap();
        assert_eq!(config.gamma_q16(), None);
    }

    #[test]
    fn test_manual_exposure_clears_auto() {
        let mut config = CameraConfiguration::default();
        config.set_iso_sensitivity(400).unwrap();
        config.set_aperture(8).unwrap();
        assert_eq!(config.iso_sensitivity(), 400);
        assert_eq!(config.aperture(), 8);
        assert!(!config.exposure().auto_sensitivity);
        assert!(!config.exposure().auto_aperture);
    }

    #[test]
    fn test_color_enhancement_enabled_by_channel() {
        let mut config = CameraConfiguration::default();
        assert!(!config.color_enhancement().enabled);
        config.set_color_enhancement_v(128);
        assert_eq!(
            config.color_enhancement(),
            ColorEnhancement {
                enabled: true,
                u: 0,
                v: 128
            }
        );
    }

    #[test]
    fn test_extended_values_need_extended_target() {
        let mut generic = CameraConfiguration::default();
        assert!(generic.set_image_filter(ImageFilter::Cartoon).is_err());
        assert!(generic.set_exposure_control(ExposureControlMode::Fireworks).is_err());
        assert!(generic.set_sharpness(10).is_err());
        assert!(generic.set_target_bitrate(1_000_000).is_err());

        let mut pi = CameraConfiguration::for_target(HardwareTarget::RaspberryPi);
        assert!(pi.set_image_filter(ImageFilter::Cartoon).is_ok());
        assert!(pi.set_target_bitrate(TARGET_BITRATE_MAX + 1).is_err());
        assert_eq!(pi.control_rate(), ControlRate::Variable);
    }

    #[test]
    fn test_enum_tables() {
        assert_eq!(ImageFilter::all(HardwareTarget::Generic).len(), 11);
        assert_eq!(ImageFilter::all(HardwareTarget::RaspberryPi).len(), 23);
        assert_eq!(ImageFilter::ColourSwap.value(), 0x7F00_0008);
        assert_eq!(ImageFilter::from_nick("color-swap"), Some(ImageFilter::ColourSwap));
        assert_eq!(ExposureControlMode::Fireworks.value(), 0x7F00_0004);
        assert_eq!(ExposureControlMode::from_value(0x7F00_0000), Some(ExposureControlMode::VeryLong));
        assert_eq!(ControlRate::from_nick("variable-skip-frames"), Some(ControlRate::VariableSkipFrames));
        assert_eq!(WhiteBalanceMode::Auto.label(), "Automatic white balance control");
        assert_eq!(ExposureMeteringMode::all(HardwareTarget::Generic).len(), 3);
    }

    #[test]
    fn test_target_ranges() {
        let pi = HardwareTarget::RaspberryPi;
        assert_eq!(pi.width_range(), (64, 1920));
        assert!(pi.is_blacklisted(crate::il::CompressionFormat::Mjpeg));
        assert!(!pi.is_blacklisted(crate::il::CompressionFormat::Avc));
        assert!(!HardwareTarget::Generic.is_blacklisted(crate::il::CompressionFormat::Mjpeg));
        assert_eq!(HardwareTarget::Generic.fixate_defaults().width, 320);
    }

    #[test]
    fn test_settings_builder_retargets_camera() {
        let settings = SourceSettings::raspberry_pi();
        assert_eq!(settings.camera.target(), HardwareTarget::RaspberryPi);
        assert_eq!(settings.fixate.framerate, Framerate::FPS_25);
    }
}
