//! Byte order, segment names and the field range bitmask

use std::fmt;
use std::ops::{BitOr, BitOrAssign, Range};

use bytes::{Buf, BufMut};

/// Byte order of a multi-byte integer field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Endian {
    /// Most significant byte first
    #[default]
    Big,
    /// Least significant byte first
    Little,
}

const UINT_WIDTH: usize = 8;

impl Endian {
    /// Read an unsigned integer spanning all of `bytes`.
    ///
    /// Only the eight least significant bytes are read from wider slices.
    #[must_use]
    pub fn read_uint(self, bytes: &[u8]) -> u64 {
        let width = bytes.len().min(UINT_WIDTH);
        if width == 0 {
            return 0;
        }
        match self {
            Self::Big => (&bytes[bytes.len() - width..]).get_uint(width),
            Self::Little => (&bytes[..width]).get_uint_le(width),
        }
    }

    /// Write `value` into all of `dst`, truncating high bits.
    ///
    /// Bytes of a slice wider than eight beyond the value's width are zeroed.
    pub fn write_uint(self, dst: &mut [u8], value: u64) {
        let width = dst.len().min(UINT_WIDTH);
        if width == 0 {
            return;
        }
        let split = dst.len() - width;
        match self {
            Self::Big => {
                let (high, mut low) = dst.split_at_mut(split);
                high.fill(0);
                low.put_uint(value, width);
            }
            Self::Little => {
                let (mut low, high) = dst.split_at_mut(width);
                high.fill(0);
                low.put_uint_le(value, width);
            }
        }
    }
}

/// The seven segments of a frame, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Leading marker
    Prefix,
    /// Command bytes
    Command,
    /// Dynamic length field
    Length,
    /// Opaque header extension
    AlterData,
    /// Payload
    Content,
    /// Checksum region
    Crc,
    /// Trailing marker
    Suffix,
}

impl SegmentKind {
    /// All segment kinds in wire order
    pub const ALL: [Self; 7] = [
        Self::Prefix,
        Self::Command,
        Self::Length,
        Self::AlterData,
        Self::Content,
        Self::Crc,
        Self::Suffix,
    ];

    /// Range bit selecting this segment
    #[must_use]
    pub const fn range_bit(self) -> FieldRange {
        match self {
            Self::Prefix => FieldRange::PREFIX,
            Self::Command => FieldRange::COMMAND,
            Self::Length => FieldRange::LENGTH,
            Self::AlterData => FieldRange::ALTER_DATA,
            Self::Content => FieldRange::CONTENT,
            Self::Crc => FieldRange::CRC,
            Self::Suffix => FieldRange::SUFFIX,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prefix => "prefix",
            Self::Command => "command",
            Self::Length => "length",
            Self::AlterData => "alterData",
            Self::Content => "content",
            Self::Crc => "crc",
            Self::Suffix => "suffix",
        };
        write!(f, "{name}")
    }
}

/// Set of frame segments, used to select length and checksum coverage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct FieldRange(u8);

impl FieldRange {
    /// No segments
    pub const NONE: Self = Self(0);
    /// Prefix marker
    pub const PREFIX: Self = Self(1 << 0);
    /// Command bytes
    pub const COMMAND: Self = Self(1 << 1);
    /// Length field
    pub const LENGTH: Self = Self(1 << 2);
    /// Header extension
    pub const ALTER_DATA: Self = Self(1 << 3);
    /// Payload
    pub const CONTENT: Self = Self(1 << 4);
    /// Checksum region
    pub const CRC: Self = Self(1 << 5);
    /// Suffix marker
    pub const SUFFIX: Self = Self(1 << 6);
    /// Every segment
    pub const ALL: Self = Self(0x7F);

    /// Create from raw bits, rejecting unknown bits
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether every segment in `other` is selected
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check whether `kind` is selected
    #[must_use]
    pub const fn includes(self, kind: SegmentKind) -> bool {
        self.contains(kind.range_bit())
    }
}

impl BitOr for FieldRange {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FieldRange {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Byte range of one segment inside a frame buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Offset of the first byte
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

impl Segment {
    /// Create a segment
    #[must_use]
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Offset one past the last byte
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Check whether the segment is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index range into the frame buffer
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Locations of all seven segments of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Segments([Segment; 7]);

impl Segments {
    /// Segment of the given kind
    #[must_use]
    pub const fn get(&self, kind: SegmentKind) -> Segment {
        self.0[kind.index()]
    }

    /// Replace the segment of the given kind
    pub fn set(&mut self, kind: SegmentKind, segment: Segment) {
        self.0[kind.index()] = segment;
    }

    /// Iterate segments in wire order
    pub fn iter(&self) -> impl Iterator<Item = (SegmentKind, Segment)> + '_ {
        SegmentKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.get(kind)))
    }

    /// Check that the segments are in wire order and exactly tile `len` bytes
    #[must_use]
    pub fn tiles(&self, len: usize) -> bool {
        let mut cursor = 0;
        for (_, segment) in self.iter() {
            if segment.offset != cursor {
                return false;
            }
            cursor = segment.end();
        }
        cursor == len
    }
}
