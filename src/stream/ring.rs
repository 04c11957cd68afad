//! Bounded byte ring used as the decoder's input store.

use bytes::{Bytes, BytesMut};

use crate::protocol::{Error, Result};

/// Storage capability the decoder needs from its input buffer.
///
/// Offsets are relative to the oldest unconsumed byte. The decoder only ever
/// holds offsets into the ring; bytes leave it as an owned [`Bytes`] when a
/// frame is carved out.
pub trait ByteRing {
    /// Number of buffered bytes
    fn len(&self) -> usize;

    /// Maximum number of bytes the ring can hold
    fn capacity(&self) -> usize;

    /// Append bytes, failing without side effects if they do not fit
    fn append(&mut self, data: &[u8]) -> Result<()>;

    /// Byte at `offset`
    fn peek(&self, offset: usize) -> Option<u8>;

    /// Copy of `len` bytes starting at `offset`
    fn peek_slice(&self, offset: usize, len: usize) -> Option<Bytes>;

    /// Remove and return the first `len` bytes
    fn consume(&mut self, len: usize) -> Bytes;

    /// Drop the first `len` bytes without copying them out
    fn discard(&mut self, len: usize);

    /// Check whether the ring is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free space left
    fn available(&self) -> usize {
        self.capacity() - self.len()
    }

    /// Compare `pattern` with the bytes at `offset`.
    ///
    /// Returns `None` if fewer than `pattern.len()` bytes are buffered there.
    fn matches_at(&self, offset: usize, pattern: &[u8]) -> Option<bool> {
        if offset + pattern.len() > self.len() {
            return None;
        }
        Some(
            pattern
                .iter()
                .enumerate()
                .all(|(i, &byte)| self.peek(offset + i) == Some(byte)),
        )
    }

    /// Scan forward from `from` for `pattern`.
    ///
    /// Returns `Ok(position)` of the first match, or `Err(next)` where `next`
    /// is the first position not yet fully checked, so a later scan can
    /// resume there.
    fn find(&self, from: usize, pattern: &[u8]) -> std::result::Result<usize, usize> {
        let mut offset = from;
        while let Some(matched) = self.matches_at(offset, pattern) {
            if matched {
                return Ok(offset);
            }
            offset += 1;
        }
        Err(offset)
    }
}

/// Fixed arena with wraparound indices
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Box<[u8]>,
    head: usize,
    len: usize,
}

impl RingBuffer {
    /// Create a ring holding at most `capacity` bytes
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Drop every buffered byte
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    fn index(&self, offset: usize) -> usize {
        (self.head + offset) % self.data.len()
    }

    /// The two contiguous runs making up `offset..offset + len`
    fn runs(&self, offset: usize, len: usize) -> (&[u8], &[u8]) {
        let start = self.index(offset);
        let first = len.min(self.data.len() - start);
        (&self.data[start..start + first], &self.data[..len - first])
    }
}

impl ByteRing for RingBuffer {
    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn append(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.available() {
            return Err(Error::BufferFull {
                needed: data.len(),
                available: self.available(),
            });
        }
        let start = self.index(self.len);
        let first = data.len().min(self.data.len() - start);
        self.data[start..start + first].copy_from_slice(&data[..first]);
        self.data[..data.len() - first].copy_from_slice(&data[first..]);
        self.len += data.len();
        Ok(())
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        (offset < self.len).then(|| self.data[self.index(offset)])
    }

    fn peek_slice(&self, offset: usize, len: usize) -> Option<Bytes> {
        if offset + len > self.len {
            return None;
        }
        let (first, second) = self.runs(offset, len);
        let mut out = BytesMut::with_capacity(len);
        out.extend_from_slice(first);
        out.extend_from_slice(second);
        Some(out.freeze())
    }

    fn consume(&mut self, len: usize) -> Bytes {
        let len = len.min(self.len);
        let out = self.peek_slice(0, len).unwrap_or_default();
        self.discard(len);
        out
    }

    fn discard(&mut self, len: usize) {
        let len = len.min(self.len);
        self.head = self.index(len);
        self.len -= len;
        if self.len == 0 {
            self.head = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_peek() {
        let mut ring = RingBuffer::new(8);
        ring.append(&[1, 2, 3]).unwrap();
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.peek(0), Some(1));
        assert_eq!(ring.peek(2), Some(3));
        assert_eq!(ring.peek(3), None);
        assert_eq!(ring.peek_slice(1, 2).unwrap().as_ref(), &[2, 3]);
        assert!(ring.peek_slice(2, 2).is_none());
    }

    #[test]
    fn test_wraparound() {
        let mut ring = RingBuffer::new(4);
        ring.append(&[1, 2, 3]).unwrap();
        ring.discard(2);
        ring.append(&[4, 5, 6]).unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.available(), 0);
        assert_eq!(ring.peek_slice(0, 4).unwrap().as_ref(), &[3, 4, 5, 6]);
        assert_eq!(ring.consume(3).as_ref(), &[3, 4, 5]);
        assert_eq!(ring.peek(0), Some(6));
    }

    #[test]
    fn test_append_beyond_capacity() {
        let mut ring = RingBuffer::new(4);
        ring.append(&[1, 2, 3]).unwrap();
        let err = ring.append(&[4, 5]).unwrap_err();
        assert!(matches!(
            err,
            Error::BufferFull {
                needed: 2,
                available: 1
            }
        ));
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_find_resumes() {
        let mut ring = RingBuffer::new(16);
        ring.append(&[0, 0, 0xFF]).unwrap();
        assert_eq!(ring.find(0, &[0xFF, 0xFE]), Err(2));
        ring.append(&[0xFE, 1]).unwrap();
        assert_eq!(ring.find(2, &[0xFF, 0xFE]), Ok(2));
        assert_eq!(ring.matches_at(2, &[0xFF, 0xFE]), Some(true));
        assert_eq!(ring.matches_at(4, &[0x01, 0x02]), None);
    }
}
