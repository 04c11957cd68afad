//! Frame entity: one contiguous buffer plus its seven segments

use bytes::{Bytes, BytesMut};

use super::error::{Error, Result};
use super::types::{Endian, FieldRange, SegmentKind, Segments};

/// Byte orders of the integer-valued segments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldEndians {
    /// Length field byte order
    pub length: Endian,
    /// Checksum byte order
    pub crc: Endian,
}

/// Typed read access to the segments of a frame
pub trait FrameView {
    /// Whole frame buffer
    fn as_bytes(&self) -> &[u8];

    /// Segment locations
    fn segments(&self) -> &Segments;

    /// Byte orders used by [`length_value`](Self::length_value) and
    /// [`crc_value`](Self::crc_value)
    fn endians(&self) -> FieldEndians;

    /// Bytes of one segment
    fn segment(&self, kind: SegmentKind) -> &[u8] {
        &self.as_bytes()[self.segments().get(kind).range()]
    }

    /// Prefix marker bytes
    fn prefix(&self) -> &[u8] {
        self.segment(SegmentKind::Prefix)
    }

    /// Command bytes
    fn command(&self) -> &[u8] {
        self.segment(SegmentKind::Command)
    }

    /// Raw length field
    fn length_field(&self) -> &[u8] {
        self.segment(SegmentKind::Length)
    }

    /// Header extension bytes
    fn alter_data(&self) -> &[u8] {
        self.segment(SegmentKind::AlterData)
    }

    /// Payload
    fn content(&self) -> &[u8] {
        self.segment(SegmentKind::Content)
    }

    /// Raw checksum bytes
    fn crc(&self) -> &[u8] {
        self.segment(SegmentKind::Crc)
    }

    /// Suffix marker bytes
    fn suffix(&self) -> &[u8] {
        self.segment(SegmentKind::Suffix)
    }

    /// Segment interpreted as an unsigned integer, see [`Endian::read_uint`]
    fn read_uint(&self, kind: SegmentKind, endian: Endian) -> u64 {
        endian.read_uint(self.segment(kind))
    }

    /// Length field as an integer, 0 when the frame has none
    fn length_value(&self) -> u64 {
        self.read_uint(SegmentKind::Length, self.endians().length)
    }

    /// Checksum as an integer, 0 when the frame has none
    fn crc_value(&self) -> u64 {
        self.read_uint(SegmentKind::Crc, self.endians().crc)
    }

    /// Slices covered by a checksum over `range`, in wire order.
    ///
    /// Empty segments are skipped.
    fn crc_coverage(&self, range: FieldRange) -> impl Iterator<Item = &[u8]> {
        self.segments()
            .iter()
            .filter(move |(kind, segment)| range.includes(*kind) && !segment.is_empty())
            .map(move |(_, segment)| &self.as_bytes()[segment.range()])
    }

    /// Total frame size in bytes
    fn wire_size(&self) -> usize {
        self.as_bytes().len()
    }
}

/// Immutable frame, as produced by the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    buf: Bytes,
    segments: Segments,
    endians: FieldEndians,
}

impl Frame {
    /// Create a frame from a buffer and its segment layout
    #[must_use]
    pub fn from_parts(buf: Bytes, segments: Segments) -> Self {
        debug_assert!(segments.tiles(buf.len()), "segments must tile the buffer");
        Self {
            buf,
            segments,
            endians: FieldEndians::default(),
        }
    }

    /// Set the byte orders of the integer-valued segments
    #[must_use]
    pub fn with_endians(mut self, endians: FieldEndians) -> Self {
        self.endians = endians;
        self
    }

    /// Shared handle to the frame buffer
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.buf
    }

    /// Consume the frame and return its buffer
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.buf
    }
}

impl FrameView for Frame {
    fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn segments(&self) -> &Segments {
        &self.segments
    }

    fn endians(&self) -> FieldEndians {
        self.endians
    }
}

impl From<Frame> for Bytes {
    fn from(frame: Frame) -> Self {
        frame.into_bytes()
    }
}

/// Writable frame, as produced by the encoder
///
/// Prefix, command, length and suffix are already in place; alterData,
/// content and checksum start zeroed for the caller to fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMut {
    buf: BytesMut,
    segments: Segments,
    endians: FieldEndians,
}

impl FrameMut {
    pub(crate) fn zeroed(segments: Segments, len: usize, endians: FieldEndians) -> Self {
        Self {
            buf: BytesMut::zeroed(len),
            segments,
            endians,
        }
    }

    /// Mutable bytes of one segment
    pub fn segment_mut(&mut self, kind: SegmentKind) -> &mut [u8] {
        let range = self.segments.get(kind).range();
        &mut self.buf[range]
    }

    /// Mutable payload
    pub fn content_mut(&mut self) -> &mut [u8] {
        self.segment_mut(SegmentKind::Content)
    }

    /// Mutable header extension
    pub fn alter_data_mut(&mut self) -> &mut [u8] {
        self.segment_mut(SegmentKind::AlterData)
    }

    /// Mutable checksum bytes
    pub fn crc_mut(&mut self) -> &mut [u8] {
        self.segment_mut(SegmentKind::Crc)
    }

    /// Copy `data` into a segment of exactly the same size
    pub fn write_segment(&mut self, kind: SegmentKind, data: &[u8]) -> Result<()> {
        let dst = self.segment_mut(kind);
        if dst.len() != data.len() {
            return Err(Error::ContentSizeMismatch {
                expected: dst.len(),
                got: data.len(),
            });
        }
        dst.copy_from_slice(data);
        Ok(())
    }

    /// Copy the payload into the content segment
    pub fn set_content(&mut self, content: &[u8]) -> Result<()> {
        self.write_segment(SegmentKind::Content, content)
    }

    /// Copy the header extension into its segment
    pub fn set_alter_data(&mut self, data: &[u8]) -> Result<()> {
        self.write_segment(SegmentKind::AlterData, data)
    }

    /// Write an unsigned integer over a whole segment, see [`Endian::write_uint`]
    pub fn put_uint(&mut self, kind: SegmentKind, value: u64, endian: Endian) {
        endian.write_uint(self.segment_mut(kind), value);
    }

    /// Write a checksum value in the schema's checksum byte order
    pub fn set_crc(&mut self, value: u64) {
        let endian = self.endians.crc;
        self.put_uint(SegmentKind::Crc, value, endian);
    }

    /// Finish writing and return an immutable frame
    #[must_use]
    pub fn freeze(self) -> Frame {
        Frame::from_parts(self.buf.freeze(), self.segments).with_endians(self.endians)
    }
}

impl FrameView for FrameMut {
    fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn segments(&self) -> &Segments {
        &self.segments
    }

    fn endians(&self) -> FieldEndians {
        self.endians
    }
}

impl From<FrameMut> for Bytes {
    fn from(frame: FrameMut) -> Self {
        frame.buf.freeze()
    }
}
