//! Video capability (caps) types for format negotiation.
//!
//! Caps describe what a source can produce or what a consumer accepts, as
//! a list of [`VideoCaps`] structures. Each structure names a container
//! type and constrains its fields with [`CapsValue`]s.
//!
//! # Caps Negotiation
//!
//! - [`CapsValue<T>`]: A value that can be fixed, range, list, or any
//! - [`VideoCaps`]: One media type with constrained geometry and rate
//! - [`Caps`]: An ordered union of structures, or `ANY`
//!
//! ```rust
//! use omxcamsrc::format::{Caps, CapsValue, Framerate, RawLayout, VideoCaps};
//!
//! let template = VideoCaps::raw(RawLayout::I420)
//!     .with_size_range(0, 4096, 0, 4096)
//!     .with_framerate_range(Framerate::new(0, 1), Framerate::new(60, 1));
//!
//! let request = VideoCaps::raw(RawLayout::I420)
//!     .with_size(480, 270)
//!     .with_framerate(Framerate::new(25, 1));
//!
//! assert!(request.is_subset_of(&template));
//! let caps = Caps::from(template).intersect(&Caps::from(request));
//! assert_eq!(caps.structures().len(), 1);
//! ```

use smallvec::SmallVec;
use std::fmt;

// ============================================================================
// CapsValue - constraint value for negotiation
// ============================================================================

/// A value that can be fixed, range, list, or any.
///
/// `Any` doubles as "field not present": a template with an `Any` field
/// places no constraint on it, while a request with an `Any` field is not
/// a subset of a template that constrains it.
///
/// # Examples
///
/// ```rust
/// use omxcamsrc::format::CapsValue;
///
/// let fixed: CapsValue<u32> = CapsValue::Fixed(1920);
/// let range: CapsValue<u32> = CapsValue::Range { min: 720, max: 1920 };
///
/// assert_eq!(fixed.intersect(&range), Some(CapsValue::Fixed(1920)));
/// assert!(fixed.is_subset_of(&range));
/// assert!(!range.is_subset_of(&fixed));
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum CapsValue<T> {
    /// Exact value (fully constrained).
    Fixed(T),
    /// Range of acceptable values (inclusive).
    Range {
        /// Minimum acceptable value.
        min: T,
        /// Maximum acceptable value.
        max: T,
    },
    /// List of acceptable values (ordered by preference, first is best).
    List(Vec<T>),
    /// Any value accepted (unconstrained).
    #[default]
    Any,
}

impl<T: Clone + Ord> CapsValue<T> {
    /// Check if a value is accepted by this constraint.
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::Fixed(v) => v == value,
            Self::Range { min, max } => value >= min && value <= max,
            Self::List(values) => values.contains(value),
            Self::Any => true,
        }
    }

    /// Intersect two constraints, finding common values.
    ///
    /// Returns `None` if there's no overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Any, other) => Some(other.clone()),
            (self_, Self::Any) => Some(self_.clone()),

            (Self::Fixed(a), Self::Fixed(b)) => (a == b).then(|| Self::Fixed(a.clone())),

            (Self::Fixed(v), Self::Range { min, max })
            | (Self::Range { min, max }, Self::Fixed(v)) => {
                (v >= min && v <= max).then(|| Self::Fixed(v.clone()))
            }

            (Self::Fixed(v), Self::List(list)) | (Self::List(list), Self::Fixed(v)) => {
                list.contains(v).then(|| Self::Fixed(v.clone()))
            }

            (
                Self::Range {
                    min: min1,
                    max: max1,
                },
                Self::Range {
                    min: min2,
                    max: max2,
                },
            ) => {
                let new_min = min1.max(min2);
                let new_max = max1.min(max2);
                if new_min < new_max {
                    Some(Self::Range {
                        min: new_min.clone(),
                        max: new_max.clone(),
                    })
                } else if new_min == new_max {
                    Some(Self::Fixed(new_min.clone()))
                } else {
                    None
                }
            }

            (Self::Range { min, max }, Self::List(list))
            | (Self::List(list), Self::Range { min, max }) => Self::from_candidates(
                list.iter()
                    .filter(|v| *v >= min && *v <= max)
                    .cloned()
                    .collect(),
            ),

            // Common values, preserving order from the first list
            (Self::List(list1), Self::List(list2)) => Self::from_candidates(
                list1
                    .iter()
                    .filter(|v| list2.contains(v))
                    .cloned()
                    .collect(),
            ),
        }
    }

    fn from_candidates(mut values: Vec<T>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::Fixed),
            _ => Some(Self::List(values)),
        }
    }

    /// Check if every value accepted by `self` is accepted by `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        match (self, other) {
            (_, Self::Any) => true,
            (Self::Any, _) => false,
            (Self::Fixed(v), other) => other.accepts(v),
            (Self::List(values), other) => values.iter().all(|v| other.accepts(v)),
            (Self::Range { min, max }, Self::Range { min: omin, max: omax }) => {
                min >= omin && max <= omax
            }
            (Self::Range { min, max }, Self::Fixed(v)) => min == v && max == v,
            (Self::Range { min, max }, Self::List(list)) => {
                min == max && list.contains(min)
            }
        }
    }

    /// Fixate: choose a single value from the constraint.
    ///
    /// Returns the preferred value (first in list, min in range).
    /// Returns `None` for `Any` (cannot fixate without default).
    pub fn fixate(&self) -> Option<T> {
        match self {
            Self::Fixed(v) => Some(v.clone()),
            Self::Range { min, .. } => Some(min.clone()),
            Self::List(values) => values.first().cloned(),
            Self::Any => None,
        }
    }

    /// Check if this is a fixed value.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Check if this accepts any value.
    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Get the fixed value if this is fixed.
    #[inline]
    pub fn as_fixed(&self) -> Option<&T> {
        match self {
            Self::Fixed(v) => Some(v),
            _ => None,
        }
    }
}

/// Distance between two values, used to fixate towards a preferred value.
pub trait Nearest {
    /// Absolute distance between `self` and `other`.
    fn distance(&self, other: &Self) -> f64;
}

impl Nearest for u32 {
    fn distance(&self, other: &Self) -> f64 {
        self.abs_diff(*other) as f64
    }
}

impl<T: Clone + Ord + Nearest> CapsValue<T> {
    /// Fixate to the value nearest `target`.
    ///
    /// Ranges clamp the target into bounds, lists pick the closest entry
    /// (earliest wins on ties), `Any` takes the target itself.
    pub fn fixate_nearest(&self, target: &T) -> Option<T> {
        match self {
            Self::Fixed(v) => Some(v.clone()),
            Self::Range { min, max } if min <= max => {
                Some(target.clone().clamp(min.clone(), max.clone()))
            }
            Self::Range { .. } => None,
            Self::List(values) => values
                .iter()
                .fold(None::<&T>, |best, v| match best {
                    Some(b) if b.distance(target) <= v.distance(target) => Some(b),
                    _ => Some(v),
                })
                .cloned(),
            Self::Any => Some(target.clone()),
        }
    }
}

impl<T: Clone + Ord> From<T> for CapsValue<T> {
    fn from(value: T) -> Self {
        Self::Fixed(value)
    }
}

impl<T: Clone + Ord> From<std::ops::RangeInclusive<T>> for CapsValue<T> {
    fn from(range: std::ops::RangeInclusive<T>) -> Self {
        let (min, max) = range.into_inner();
        Self::Range { min, max }
    }
}

impl<T: fmt::Display> fmt::Display for CapsValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "{v}"),
            Self::Range { min, max } => write!(f, "[ {min}, {max} ]"),
            Self::List(values) => {
                write!(f, "{{ ")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, " }}")
            }
            Self::Any => write!(f, "ANY"),
        }
    }
}

// ============================================================================
// Field types
// ============================================================================

/// Frame rate as numerator/denominator (8 bytes, Copy).
///
/// Ordering compares the fractions by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Framerate {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (time units).
    pub den: u32,
}

impl Framerate {
    /// Create a new framerate.
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// 25 fps (PAL).
    pub const FPS_25: Self = Self::new(25, 1);
    /// 30 fps.
    pub const FPS_30: Self = Self::new(30, 1);

    /// Get the framerate as a floating-point value.
    #[inline]
    pub fn fps(&self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }

    /// Reduce the fraction to lowest terms.
    pub fn reduced(self) -> Self {
        let g = gcd(self.num, self.den);
        if g <= 1 {
            self
        } else {
            Self::new(self.num / g, self.den / g)
        }
    }

    /// Q16 fixed-point representation, as hardware frame-rate fields expect.
    ///
    /// Returns `None` when the rate does not fit in 32 bits. An unset rate
    /// (zero denominator) is `Some(0)`.
    #[inline]
    pub fn to_q16(&self) -> Option<u32> {
        if self.den == 0 {
            return Some(0);
        }
        u32::try_from((u64::from(self.num) << 16) / u64::from(self.den)).ok()
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Default for Framerate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl PartialOrd for Framerate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Framerate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Compare as fractions: a/b vs c/d => a*d vs c*b
        let lhs = (self.num as u64) * (other.den as u64);
        let rhs = (other.num as u64) * (self.den as u64);
        lhs.cmp(&rhs)
    }
}

impl Nearest for Framerate {
    fn distance(&self, other: &Self) -> f64 {
        (self.fps() - other.fps()).abs()
    }
}

impl fmt::Display for Framerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Planar raw pixel layouts the camera can deliver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RawLayout {
    /// Planar YUV 4:1:1.
    Y41b,
    /// Planar YUV 4:2:0.
    I420,
    /// Semi-planar YUV 4:2:0.
    Nv12,
    /// Planar YUV 4:2:2.
    Y42b,
    /// Semi-planar YUV 4:2:2.
    Nv16,
    /// Semi-planar YUV 4:4:4.
    Nv24,
}

impl RawLayout {
    /// Format name as it appears in caps.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Y41b => "Y41B",
            Self::I420 => "I420",
            Self::Nv12 => "NV12",
            Self::Y42b => "Y42B",
            Self::Nv16 => "NV16",
            Self::Nv24 => "NV24",
        }
    }
}

impl fmt::Display for RawLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Container type of a caps structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Uncompressed video.
    RawVideo,
    /// MPEG video (version in a separate field).
    Mpeg,
    /// H.263.
    H263,
    /// Windows Media Video.
    Wmv,
    /// RealVideo.
    RealVideo,
    /// H.264 / AVC.
    H264,
    /// Motion JPEG.
    Jpeg,
    /// VP6.
    Vp6,
    /// VP7.
    Vp7,
    /// VP8.
    Vp8,
    /// Sorenson video.
    Svq,
    /// Theora.
    Theora,
}

impl MediaKind {
    /// Media type string.
    pub const fn media_type(&self) -> &'static str {
        match self {
            Self::RawVideo => "video/x-raw",
            Self::Mpeg => "video/mpeg",
            Self::H263 => "video/x-h263",
            Self::Wmv => "video/x-wmv",
            Self::RealVideo => "video/x-pn-realvideo",
            Self::H264 => "video/x-h264",
            Self::Jpeg => "image/jpeg",
            Self::Vp6 => "video/x-vp6",
            Self::Vp7 => "video/x-vp7",
            Self::Vp8 => "video/x-vp8",
            Self::Svq => "video/x-svq",
            Self::Theora => "video/x-theora",
        }
    }

    /// Check if this is uncompressed video.
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::RawVideo)
    }
}

// ============================================================================
// VideoCaps - one caps structure
// ============================================================================

/// One caps structure: a media kind plus constrained fields.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoCaps {
    /// Container type.
    pub kind: MediaKind,
    /// Raw pixel layout (raw video only).
    pub layout: CapsValue<RawLayout>,
    /// MPEG version (MPEG only).
    pub mpeg_version: CapsValue<u32>,
    /// Width constraint.
    pub width: CapsValue<u32>,
    /// Height constraint.
    pub height: CapsValue<u32>,
    /// Framerate constraint.
    pub framerate: CapsValue<Framerate>,
    /// Pixel aspect ratio constraint.
    pub pixel_aspect_ratio: CapsValue<Framerate>,
}

impl VideoCaps {
    /// Unconstrained structure of the given kind.
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            layout: CapsValue::Any,
            mpeg_version: CapsValue::Any,
            width: CapsValue::Any,
            height: CapsValue::Any,
            framerate: CapsValue::Any,
            pixel_aspect_ratio: CapsValue::Any,
        }
    }

    /// Raw video with a fixed layout.
    pub fn raw(layout: RawLayout) -> Self {
        Self {
            layout: CapsValue::Fixed(layout),
            ..Self::new(MediaKind::RawVideo)
        }
    }

    /// Set a fixed size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = CapsValue::Fixed(width);
        self.height = CapsValue::Fixed(height);
        self
    }

    /// Set a size range.
    pub fn with_size_range(mut self, min_w: u32, max_w: u32, min_h: u32, max_h: u32) -> Self {
        self.width = CapsValue::Range {
            min: min_w,
            max: max_w,
        };
        self.height = CapsValue::Range {
            min: min_h,
            max: max_h,
        };
        self
    }

    /// Set a fixed framerate.
    pub fn with_framerate(mut self, framerate: Framerate) -> Self {
        self.framerate = CapsValue::Fixed(framerate);
        self
    }

    /// Set a framerate range.
    pub fn with_framerate_range(mut self, min: Framerate, max: Framerate) -> Self {
        self.framerate = CapsValue::Range { min, max };
        self
    }

    /// Set the MPEG version.
    pub fn with_mpeg_version(mut self, version: u32) -> Self {
        self.mpeg_version = CapsValue::Fixed(version);
        self
    }

    /// Intersect with another structure.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if self.kind != other.kind {
            return None;
        }
        Some(Self {
            kind: self.kind,
            layout: self.layout.intersect(&other.layout)?,
            mpeg_version: self.mpeg_version.intersect(&other.mpeg_version)?,
            width: self.width.intersect(&other.width)?,
            height: self.height.intersect(&other.height)?,
            framerate: self.framerate.intersect(&other.framerate)?,
            pixel_aspect_ratio: self.pixel_aspect_ratio.intersect(&other.pixel_aspect_ratio)?,
        })
    }

    /// Check if this structure is a subset of `other`.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.layout.is_subset_of(&other.layout)
            && self.mpeg_version.is_subset_of(&other.mpeg_version)
            && self.width.is_subset_of(&other.width)
            && self.height.is_subset_of(&other.height)
            && self.framerate.is_subset_of(&other.framerate)
            && self.pixel_aspect_ratio.is_subset_of(&other.pixel_aspect_ratio)
    }

    /// Check if no field is left as a range or list.
    pub fn is_fixed(&self) -> bool {
        fn settled<T: Clone + Ord>(v: &CapsValue<T>) -> bool {
            v.is_fixed() || v.is_any()
        }
        settled(&self.layout)
            && settled(&self.mpeg_version)
            && self.width.is_fixed()
            && self.height.is_fixed()
            && self.framerate.is_fixed()
            && settled(&self.pixel_aspect_ratio)
    }

    /// Fixate every field, preferring values nearest the given defaults.
    ///
    /// A pixel aspect ratio that is constrained but not fixed becomes the
    /// reduced fraction width/height.
    pub fn fixate_nearest(&self, width: u32, height: u32, framerate: Framerate) -> Option<Self> {
        let width = self.width.fixate_nearest(&width)?;
        let height = self.height.fixate_nearest(&height)?;
        let framerate = self.framerate.fixate_nearest(&framerate)?;
        let pixel_aspect_ratio = match &self.pixel_aspect_ratio {
            CapsValue::Any => CapsValue::Any,
            par => {
                let derived = Framerate::new(width, height.max(1)).reduced();
                CapsValue::Fixed(par.fixate_nearest(&derived)?)
            }
        };
        Some(Self {
            kind: self.kind,
            layout: fixate_or_any(&self.layout),
            mpeg_version: fixate_or_any(&self.mpeg_version),
            width: CapsValue::Fixed(width),
            height: CapsValue::Fixed(height),
            framerate: CapsValue::Fixed(framerate),
            pixel_aspect_ratio,
        })
    }
}

fn fixate_or_any<T: Clone + Ord>(value: &CapsValue<T>) -> CapsValue<T> {
    value.fixate().map_or(CapsValue::Any, CapsValue::Fixed)
}

impl fmt::Display for VideoCaps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.media_type())?;
        if !self.layout.is_any() {
            write!(f, ", format={}", self.layout)?;
        }
        if !self.mpeg_version.is_any() {
            write!(f, ", mpegversion={}", self.mpeg_version)?;
        }
        if !self.width.is_any() {
            write!(f, ", width={}", self.width)?;
        }
        if !self.height.is_any() {
            write!(f, ", height={}", self.height)?;
        }
        if !self.framerate.is_any() {
            write!(f, ", framerate={}", self.framerate)?;
        }
        if !self.pixel_aspect_ratio.is_any() {
            write!(f, ", pixel-aspect-ratio={}", self.pixel_aspect_ratio)?;
        }
        Ok(())
    }
}

// ============================================================================
// Caps - ordered union of structures
// ============================================================================

/// An ordered union of caps structures, or `ANY`.
#[derive(Clone, Debug, PartialEq)]
pub enum Caps {
    /// Accepts everything.
    Any,
    /// Accepts what any of the structures accepts; empty accepts nothing.
    Structures(SmallVec<[VideoCaps; 2]>),
}

impl Caps {
    /// Caps accepting everything.
    pub fn any() -> Self {
        Self::Any
    }

    /// Caps accepting nothing.
    pub fn empty() -> Self {
        Self::Structures(SmallVec::new())
    }

    /// Check if these caps accept nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Structures(s) if s.is_empty())
    }

    /// Check if these caps are `ANY`.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// The structures, in preference order. Empty for `ANY`.
    pub fn structures(&self) -> &[VideoCaps] {
        match self {
            Self::Any => &[],
            Self::Structures(s) => s,
        }
    }

    /// Append the structures of `other`. Appending to `ANY` is a no-op.
    pub fn append(&mut self, other: Caps) {
        match (self, other) {
            (Self::Any, _) => {}
            (this, Self::Any) => *this = Self::Any,
            (Self::Structures(s), Self::Structures(o)) => s.extend(o),
        }
    }

    /// Intersect, keeping the structure order of `self`.
    pub fn intersect(&self, other: &Caps) -> Caps {
        match (self, other) {
            (Self::Any, other) => other.clone(),
            (this, Self::Any) => this.clone(),
            (Self::Structures(a), Self::Structures(b)) => Self::Structures(
                a.iter()
                    .flat_map(|sa| b.iter().filter_map(move |sb| sa.intersect(sb)))
                    .collect(),
            ),
        }
    }

    /// Check if everything accepted by `self` is accepted by `other`.
    pub fn is_subset_of(&self, other: &Caps) -> bool {
        match (self, other) {
            (_, Self::Any) => true,
            (Self::Any, _) => false,
            (Self::Structures(a), Self::Structures(b)) => a
                .iter()
                .all(|sa| b.iter().any(|sb| sa.is_subset_of(sb))),
        }
    }

    /// Check if these caps describe exactly one concrete format.
    pub fn is_fixed(&self) -> bool {
        matches!(self.structures(), [only] if only.is_fixed())
    }

    /// Keep only the first structure.
    pub fn truncate(self) -> Caps {
        match self {
            Self::Any => Self::Any,
            Self::Structures(mut s) => {
                s.truncate(1);
                Self::Structures(s)
            }
        }
    }
}

impl From<VideoCaps> for Caps {
    fn from(caps: VideoCaps) -> Self {
        let mut s = SmallVec::new();
        s.push(caps);
        Self::Structures(s)
    }
}

impl FromIterator<VideoCaps> for Caps {
    fn from_iter<I: IntoIterator<Item = VideoCaps>>(iter: I) -> Self {
        Self::Structures(iter.into_iter().collect())
    }
}

impl fmt::Display for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::Structures(s) if s.is_empty() => f.write_str("EMPTY"),
            Self::Structures(s) => {
                for (i, structure) in s.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{structure}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbounded_i420() -> VideoCaps {
        VideoCaps::raw(RawLayout::I420)
            .with_size_range(0, i32::MAX as u32, 0, i32::MAX as u32)
            .with_framerate_range(Framerate::new(0, 1), Framerate::new(i32::MAX as u32, 1))
    }

    #[test]
    fn test_caps_value_subset() {
        let range: CapsValue<u32> = (64..=1920).into();
        assert!(CapsValue::Fixed(640).is_subset_of(&range));
        assert!(!CapsValue::Fixed(32).is_subset_of(&range));
        assert!(CapsValue::Range { min: 100, max: 200 }.is_subset_of(&range));
        assert!(!CapsValue::<u32>::Any.is_subset_of(&range));
        assert!(range.is_subset_of(&CapsValue::Any));
        assert!(CapsValue::List(vec![64, 128]).is_subset_of(&range));
    }

    #[test]
    fn test_fixate_nearest() {
        let range: CapsValue<u32> = (64..=1920).into();
        assert_eq!(range.fixate_nearest(&320), Some(320));
        assert_eq!(range.fixate_nearest(&32), Some(64));

        let list = CapsValue::List(vec![640, 300, 340]);
        // Ties keep the earliest entry
        assert_eq!(list.fixate_nearest(&320), Some(300));

        let rates: CapsValue<Framerate> = (Framerate::new(2, 1)..=Framerate::new(30, 1)).into();
        assert_eq!(rates.fixate_nearest(&Framerate::new(60, 1)), Some(Framerate::new(30, 1)));
    }

    #[test]
    fn test_fixate_keeps_fixed_request() {
        let request = VideoCaps::raw(RawLayout::I420)
            .with_size(480, 270)
            .with_framerate(Framerate::FPS_25);
        let fixed = request
            .fixate_nearest(320, 240, Framerate::FPS_30)
            .expect("fixate");
        assert_eq!(fixed, request);
        assert!(fixed.is_fixed());
    }

    #[test]
    fn test_fixate_derives_pixel_aspect_ratio() {
        let mut caps = unbounded_i420();
        caps.pixel_aspect_ratio = CapsValue::Range {
            min: Framerate::new(1, 100),
            max: Framerate::new(100, 1),
        };
        let fixed = caps
            .fixate_nearest(320, 240, Framerate::FPS_30)
            .expect("fixate");
        assert_eq!(fixed.pixel_aspect_ratio, CapsValue::Fixed(Framerate::new(4, 3)));
    }

    #[test]
    fn test_structure_subset_requires_same_kind() {
        let request = VideoCaps::new(MediaKind::H264)
            .with_size(640, 480)
            .with_framerate(Framerate::FPS_30);
        assert!(!request.is_subset_of(&unbounded_i420()));
    }

    #[test]
    fn test_request_without_layout_is_not_subset() {
        let request = VideoCaps::new(MediaKind::RawVideo)
            .with_size(640, 480)
            .with_framerate(Framerate::FPS_30);
        assert!(!request.is_subset_of(&unbounded_i420()));
    }

    #[test]
    fn test_caps_intersect_keeps_order() {
        let hw: Caps = [
            VideoCaps::new(MediaKind::H264).with_size_range(64, 1920, 64, 1080),
            VideoCaps::raw(RawLayout::I420).with_size_range(64, 1920, 64, 1080),
        ]
        .into_iter()
        .collect();
        let filter: Caps = [
            VideoCaps::raw(RawLayout::I420),
            VideoCaps::new(MediaKind::H264),
        ]
        .into_iter()
        .collect();

        let result = hw.intersect(&filter);
        assert_eq!(result.structures().len(), 2);
        assert_eq!(result.structures()[0].kind, MediaKind::H264);
        assert!(hw.intersect(&Caps::empty()).is_empty());
        assert_eq!(hw.intersect(&Caps::any()), hw);
    }

    #[test]
    fn test_framerate_helpers() {
        assert_eq!(Framerate::new(30, 1).to_q16(), Some(30 << 16));
        assert_eq!(Framerate::new(30000, 1001).to_q16(), Some(1_964_115));
        assert_eq!(Framerate::new(65535, 1).to_q16(), Some(65535 << 16));
        assert_eq!(Framerate::new(65536, 1).to_q16(), None);
        assert_eq!(Framerate::new(0, 0).to_q16(), Some(0));
        assert_eq!(Framerate::new(480, 270).reduced(), Framerate::new(16, 9));
        assert_eq!(Framerate::new(50, 2).cmp(&Framerate::FPS_25), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_display() {
        let caps = VideoCaps::raw(RawLayout::I420)
            .with_size(480, 270)
            .with_framerate(Framerate::FPS_25);
        assert_eq!(
            caps.to_string(),
            "video/x-raw, format=I420, width=480, height=270, framerate=25/1"
        );
        assert_eq!(Caps::any().to_string(), "ANY");
    }
}
