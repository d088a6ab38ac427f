//! Time types for buffer timestamps.
//!
//! [`ClockTime`] is a nanosecond count with a `NONE` sentinel, used for
//! presentation/decode timestamps and durations on produced frames.

use std::time::Duration;

// ============================================================================
// ClockTime
// ============================================================================

/// Time in nanoseconds (8 bytes, Copy).
///
/// # Special Values
///
/// - `ClockTime::ZERO`: Zero time
/// - `ClockTime::NONE`: Invalid/unset time (sentinel value), also used as
///   "unbounded" for durations of frames produced at an unset rate
/// - `ClockTime::MAX`: Maximum representable time
///
/// # Examples
///
/// ```rust
/// use omxcamsrc::clock::ClockTime;
///
/// let t1 = ClockTime::from_secs(1);
/// let t2 = ClockTime::from_millis(500);
/// let t3 = t1 + t2;
///
/// assert_eq!(t3.millis(), 1500);
/// assert_eq!(format!("{}", t3), "1.500s");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClockTime(u64);

impl ClockTime {
    /// Zero time.
    pub const ZERO: Self = Self(0);

    /// Maximum representable time (one less than NONE sentinel).
    pub const MAX: Self = Self(u64::MAX - 1);

    /// Invalid/unset time (sentinel value).
    pub const NONE: Self = Self(u64::MAX);

    /// One second.
    pub const SECOND: Self = Self(1_000_000_000);

    /// Create from nanoseconds.
    #[inline]
    pub const fn from_nanos(ns: u64) -> Self {
        Self(ns)
    }

    /// Create from milliseconds.
    #[inline]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(1_000_000))
    }

    /// Create from seconds.
    #[inline]
    pub const fn from_secs(s: u64) -> Self {
        Self(s.saturating_mul(1_000_000_000))
    }

    /// Get as nanoseconds.
    #[inline]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Get as milliseconds (truncated).
    #[inline]
    pub const fn millis(self) -> u64 {
        self.0 / 1_000_000
    }

    /// Get as seconds (truncated).
    #[inline]
    pub const fn secs(self) -> u64 {
        self.0 / 1_000_000_000
    }

    /// Check if this is the NONE sentinel value.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u64::MAX
    }

    /// Check if this is a valid time (not NONE).
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u64::MAX
    }

    /// Saturating addition. Returns NONE if either operand is NONE.
    #[inline]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        if self.is_none() || rhs.is_none() {
            return Self::NONE;
        }
        let result = self.0.saturating_add(rhs.0);
        // Don't overflow into NONE
        if result == u64::MAX {
            Self::MAX
        } else {
            Self(result)
        }
    }

    /// Saturating subtraction. Returns NONE if either operand is NONE.
    #[inline]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        if self.is_none() || rhs.is_none() {
            return Self::NONE;
        }
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Compute `self * num / denom` without intermediate overflow.
    ///
    /// Returns NONE for a NONE input or a zero denominator.
    #[inline]
    pub const fn mul_div(self, num: u64, denom: u64) -> Self {
        if self.is_none() || denom == 0 {
            return Self::NONE;
        }
        let result = (self.0 as u128 * num as u128) / denom as u128;
        if result >= u64::MAX as u128 {
            Self::MAX
        } else {
            Self(result as u64)
        }
    }
}

impl std::ops::Add for ClockTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl std::ops::AddAssign for ClockTime {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl std::ops::Sub for ClockTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl From<Duration> for ClockTime {
    #[inline]
    fn from(d: Duration) -> Self {
        Self(d.as_nanos().min(u64::MAX as u128 - 1) as u64)
    }
}

impl From<ClockTime> for Duration {
    #[inline]
    fn from(t: ClockTime) -> Self {
        if t.is_none() {
            Duration::ZERO
        } else {
            Duration::from_nanos(t.0)
        }
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NONE")
        } else {
            let secs = self.secs();
            let ms = (self.0 / 1_000_000) % 1000;
            write!(f, "{}.{:03}s", secs, ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_propagates() {
        assert!((ClockTime::NONE + ClockTime::SECOND).is_none());
        assert!((ClockTime::SECOND - ClockTime::NONE).is_none());
        assert!(ClockTime::NONE.mul_div(1, 1).is_none());
    }

    #[test]
    fn test_mul_div_frame_times() {
        // Third frame boundary at 25 fps
        let t = ClockTime::SECOND.mul_div(3, 25);
        assert_eq!(t.nanos(), 120_000_000);

        // NTSC rate, rounding down like an integer scale
        let t = ClockTime::SECOND.mul_div(1001, 30000);
        assert_eq!(t.nanos(), 33_366_666);

        assert!(ClockTime::SECOND.mul_div(1, 0).is_none());
    }

    #[test]
    fn test_add_does_not_overflow_into_none() {
        let t = ClockTime::MAX + ClockTime::SECOND;
        assert_eq!(t, ClockTime::MAX);
        assert!(t.is_some());
    }

    #[test]
    fn test_display() {
        assert_eq!(ClockTime::from_millis(40).to_string(), "0.040s");
        assert_eq!(ClockTime::NONE.to_string(), "NONE");
    }
}
