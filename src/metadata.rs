//! Buffer metadata types.

use crate::clock::ClockTime;

/// Sentinel for an unset frame offset.
pub const OFFSET_NONE: u64 = u64::MAX;

/// Flags indicating buffer properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferFlags {
    /// Buffer was produced by a live source.
    pub live: bool,
    /// Buffer holds a complete frame; authoritative end-of-frame marker.
    pub marker: bool,
    /// Buffer is corrupted or incomplete.
    pub corrupted: bool,
    /// Buffer may be dropped by downstream without consequence.
    pub droppable: bool,
}

impl BufferFlags {
    /// Mark the buffer as a complete frame.
    pub fn set_marker(&mut self, value: bool) {
        self.marker = value;
    }

    /// Check if the buffer is marked corrupted or droppable.
    pub fn is_damaged(&self) -> bool {
        self.corrupted || self.droppable
    }
}

/// Metadata associated with a buffer.
///
/// Times use [`ClockTime::NONE`] for "unset". A `NONE` duration on a
/// produced frame means the frame lasts until further notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Presentation timestamp.
    pub pts: ClockTime,

    /// Decode timestamp.
    pub dts: ClockTime,

    /// Duration of this buffer's content.
    pub duration: ClockTime,

    /// Frame number of this buffer.
    pub offset: u64,

    /// Frame number following this buffer.
    pub offset_end: u64,

    /// Buffer flags.
    pub flags: BufferFlags,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            pts: ClockTime::NONE,
            dts: ClockTime::NONE,
            duration: ClockTime::NONE,
            offset: OFFSET_NONE,
            offset_end: OFFSET_NONE,
            flags: BufferFlags::default(),
        }
    }
}

impl Metadata {
    /// Create new metadata with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the presentation timestamp.
    pub fn with_pts(mut self, pts: ClockTime) -> Self {
        self.pts = pts;
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: ClockTime) -> Self {
        self.duration = duration;
        self
    }

    /// Set the frame offsets.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self.offset_end = offset.saturating_add(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_defaults_are_unset() {
        let meta = Metadata::new();
        assert!(meta.pts.is_none());
        assert!(meta.dts.is_none());
        assert!(meta.duration.is_none());
        assert_eq!(meta.offset, OFFSET_NONE);
        assert!(!meta.flags.is_damaged());
    }

    #[test]
    fn test_metadata_builder() {
        let meta = Metadata::new()
            .with_pts(ClockTime::from_millis(40))
            .with_duration(ClockTime::from_millis(40))
            .with_offset(7);

        assert_eq!(meta.pts, ClockTime::from_millis(40));
        assert_eq!(meta.offset, 7);
        assert_eq!(meta.offset_end, 8);
    }
}
