//! Fixed-capacity byte ring staging command parameters and payloads.
//!
//! Commands append their bytes at the tail when they are queued and the
//! dispatcher consumes them from the head in the same order. Sending is
//! *send-and-retain*: [`RingBuffer::front`] copies bytes out without removing
//! them, so a retried command can be sent again. Bytes leave the buffer only
//! through [`RingBuffer::delete_front`] (after a confirmed send or a final
//! failure) or [`RingBuffer::delete_back`] (undoing a partial enqueue).

use atlink_core::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Box<[u8]>,
    head: usize,
    len: usize,
}

impl RingBuffer {
    /// Create a ring of `capacity` bytes.
    ///
    /// # Errors
    /// Returns `Error::Config` unless `capacity` is a non-zero power of two.
    pub fn new(capacity: usize) -> Result<Self> {
        if !capacity.is_power_of_two() {
            return Err(Error::Config(format!(
                "ring buffer capacity must be a power of two, got {capacity}"
            )));
        }
        Ok(Self {
            data: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn free(&self) -> usize {
        self.capacity() - self.len
    }

    #[inline]
    fn mask(&self, index: usize) -> usize {
        index & (self.capacity() - 1)
    }

    /// Append all of `bytes` or nothing.
    ///
    /// # Errors
    /// Returns `Error::BufferFull` if fewer than `bytes.len()` bytes are free.
    pub fn append(&mut self, bytes: &[u8]) -> Result<usize> {
        if bytes.len() > self.free() {
            return Err(Error::BufferFull {
                requested: bytes.len(),
                available: self.free(),
            });
        }

        let tail = self.mask(self.head + self.len);
        let first = bytes.len().min(self.capacity() - tail);
        self.data[tail..tail + first].copy_from_slice(&bytes[..first]);
        self.data[..bytes.len() - first].copy_from_slice(&bytes[first..]);
        self.len += bytes.len();
        Ok(bytes.len())
    }

    /// The first `len` stored bytes as two contiguous slices.
    ///
    /// `len` is clamped to the stored length.
    pub fn front_slices(&self, len: usize) -> (&[u8], &[u8]) {
        let len = len.min(self.len);
        let first = len.min(self.capacity() - self.head);
        (
            &self.data[self.head..self.head + first],
            &self.data[..len - first],
        )
    }

    /// Copy of the first `len` stored bytes; nothing is removed.
    pub fn front(&self, len: usize) -> Bytes {
        let (a, b) = self.front_slices(len);
        let mut out = BytesMut::with_capacity(a.len() + b.len());
        out.put_slice(a);
        out.put_slice(b);
        out.freeze()
    }

    /// Remove up to `len` bytes from the head. Returns how many were removed.
    pub fn delete_front(&mut self, len: usize) -> usize {
        let len = len.min(self.len);
        self.head = self.mask(self.head + len);
        self.len -= len;
        if self.len == 0 {
            self.head = 0;
        }
        len
    }

    /// Remove up to `len` of the most recently appended bytes.
    pub fn delete_back(&mut self, len: usize) -> usize {
        let len = len.min(self.len);
        self.len -= len;
        len
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
