//! Buffer - Raw Byte Storage Behind Arrays
//!
//! A `Buffer` is a fixed-length block of bytes shared by every array handle
//! that views it. Cloning a `Buffer` registers another viewer; the storage
//! is released when the last viewer is dropped. A buffer is never resized
//! or relocated after creation.
//!
//! # Concurrency
//! Each read or write takes the buffer's lock for the duration of the
//! guard, so single accesses are memory-safe from any thread. Sequences of
//! accesses through different handles are NOT atomic with respect to each
//! other: callers that write to one buffer from several threads must
//! serialize those writers themselves.
//!
//! # Example
//! ```rust
//! use ndview_core::Buffer;
//!
//! let buffer = Buffer::zeroed(16);
//! let view = buffer.clone();
//! assert_eq!(buffer.viewer_count(), 2);
//! view.write().unwrap()[0] = 7;
//! assert_eq!(buffer.read()[0], 7);
//! ```

use core::ops::{Deref, DerefMut};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::{Error, Result};

// =============================================================================
// Buffer Struct
// =============================================================================

/// Reference-counted byte storage.
#[derive(Debug)]
pub struct Buffer {
    inner: Arc<RwLock<BufferInner>>,
}

/// Backing bytes, either owned and writable or borrowed read-only.
#[derive(Debug)]
enum BufferInner {
    Owned(Vec<u8>),
    ReadOnly(Bytes),
}

impl Buffer {
    /// Allocates `len` zeroed bytes.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![0; len])
    }

    /// Takes ownership of an existing byte vector.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        tracing::trace!(bytes = data.len(), "allocating buffer");
        Self {
            inner: Arc::new(RwLock::new(BufferInner::Owned(data))),
        }
    }

    /// Wraps externally owned, immutable bytes without copying them.
    ///
    /// Every attempt to write through the result fails with
    /// [`Error::ReadOnlyBuffer`].
    #[must_use]
    pub fn from_bytes_readonly(data: Bytes) -> Self {
        tracing::trace!(bytes = data.len(), "wrapping read-only buffer");
        Self {
            inner: Arc::new(RwLock::new(BufferInner::ReadOnly(data))),
        }
    }

    /// Returns the length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match &*self.inner.read() {
            BufferInner::Owned(v) => v.len(),
            BufferInner::ReadOnly(b) => b.len(),
        }
    }

    /// Returns true if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if writes through this buffer are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(&*self.inner.read(), BufferInner::ReadOnly(_))
    }

    /// Number of live handles referencing this storage.
    #[must_use]
    pub fn viewer_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Returns true if this is the only viewer.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    /// Returns true if both handles reference the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Locks the buffer for reading.
    #[must_use]
    pub fn read(&self) -> BufferReadGuard<'_> {
        BufferReadGuard {
            guard: self.inner.read(),
        }
    }

    /// Locks the buffer for writing.
    ///
    /// Fails with [`Error::ReadOnlyBuffer`] on buffers created by
    /// [`Buffer::from_bytes_readonly`].
    pub fn write(&self) -> Result<BufferWriteGuard<'_>> {
        let guard = self.inner.write();
        if matches!(&*guard, BufferInner::ReadOnly(_)) {
            return Err(Error::ReadOnlyBuffer);
        }
        Ok(BufferWriteGuard { guard })
    }

    /// Copies the bytes into a new, owned, writable buffer.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self::from_vec(self.read().to_vec())
    }
}

impl Clone for Buffer {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// =============================================================================
// Guard Types for Safe Access
// =============================================================================

/// Read guard for buffer bytes.
pub struct BufferReadGuard<'a> {
    guard: parking_lot::RwLockReadGuard<'a, BufferInner>,
}

impl Deref for BufferReadGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match &*self.guard {
            BufferInner::Owned(v) => v,
            BufferInner::ReadOnly(b) => b,
        }
    }
}

/// Write guard for buffer bytes.
pub struct BufferWriteGuard<'a> {
    guard: parking_lot::RwLockWriteGuard<'a, BufferInner>,
}

impl Deref for BufferWriteGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match &*self.guard {
            BufferInner::Owned(v) => v,
            BufferInner::ReadOnly(b) => b,
        }
    }
}

impl DerefMut for BufferWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut *self.guard {
            BufferInner::Owned(v) => v,
            // Buffer::write never hands out a guard for read-only storage.
            BufferInner::ReadOnly(_) => unreachable!("write guard over read-only buffer"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
