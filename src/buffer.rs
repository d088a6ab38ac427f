//! Output buffers filled by the camera source.

use crate::metadata::Metadata;
use bytes::{Bytes, BytesMut};

/// A pipeline-owned buffer holding one output frame.
///
/// The source never allocates these itself: the caller hands in a buffer
/// sized from [`decide_allocation`](crate::CameraSrc::decide_allocation)
/// and [`fill`](crate::CameraSrc::fill) writes the frame and its metadata.
#[derive(Debug, Clone)]
pub struct Buffer {
    data: BytesMut,
    metadata: Metadata,
}

impl Buffer {
    /// Create a zero-filled buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: BytesMut::zeroed(size),
            metadata: Metadata::default(),
        }
    }

    /// Length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Borrow the contents mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite the whole buffer with `value`.
    pub fn memset(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Shorten the buffer to `len` bytes. No-op if already shorter.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Get the buffer metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Get mutable access to the buffer metadata.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Freeze the contents into an immutable, cheaply clonable handle.
    pub fn freeze(self) -> (Bytes, Metadata) {
        (self.data.freeze(), self.metadata)
    }
}
