//! Segment sizes, frame lengths and length-field arithmetic

use super::error::{Error, Result};
use super::frame::FieldEndians;
use super::schema::{DynamicLength, LengthSchema, ValidSchema};
use super::types::{Endian, Segment, SegmentKind, Segments};

/// Width of a non-content segment for the given length mode.
///
/// Content has no static width and reports 0. Free mode has neither a
/// length field nor a checksum.
#[must_use]
pub fn segment_width(schema: &ValidSchema, length: &LengthSchema, kind: SegmentKind) -> usize {
    match kind {
        SegmentKind::Prefix => schema.prefix.len(),
        SegmentKind::Command => schema.command_size,
        SegmentKind::Length => match length {
            LengthSchema::Dynamic(dynamic) => dynamic.size,
            LengthSchema::Fixed { .. } | LengthSchema::Free => 0,
        },
        SegmentKind::AlterData => schema.alter_data_size,
        SegmentKind::Content => 0,
        SegmentKind::Crc => match length {
            LengthSchema::Free => 0,
            LengthSchema::Fixed { .. } | LengthSchema::Dynamic(_) => schema.crc_size,
        },
        SegmentKind::Suffix => schema.suffix.len(),
    }
}

/// Total size of every statically present segment other than content
#[must_use]
pub fn content_overhead(schema: &ValidSchema, length: &LengthSchema) -> usize {
    SegmentKind::ALL
        .into_iter()
        .map(|kind| segment_width(schema, length, kind))
        .sum()
}

/// Bytes the length value counts on top of the content.
///
/// Encoding writes `content + overhead`, decoding reads
/// `value - overhead`.
#[must_use]
pub fn dynamic_length_overhead(schema: &ValidSchema, dynamic: &DynamicLength) -> usize {
    let range = dynamic.range();
    let length = LengthSchema::Dynamic(*dynamic);
    SegmentKind::ALL
        .into_iter()
        .filter(|&kind| range.includes(kind))
        .map(|kind| segment_width(schema, &length, kind))
        .sum()
}

/// Total wire size of a frame.
///
/// A fixed schema ignores `content_len` unless it disagrees with the
/// schema constant, which is an error. Other modes treat a missing content
/// length as zero.
pub fn total_frame_length(
    schema: &ValidSchema,
    length: &LengthSchema,
    content_len: Option<usize>,
) -> Result<usize> {
    let content_len = resolve_content_len(length, content_len)?;
    content_overhead(schema, length)
        .checked_add(content_len)
        .ok_or(Error::FrameTooLarge { content_len })
}

/// Content length of a frame, checked against a fixed schema
pub fn resolve_content_len(length: &LengthSchema, content_len: Option<usize>) -> Result<usize> {
    match *length {
        LengthSchema::Fixed { length: expected } => match content_len {
            Some(got) if got != expected => Err(Error::LengthMismatch { expected, got }),
            _ => Ok(expected),
        },
        LengthSchema::Dynamic(_) | LengthSchema::Free => Ok(content_len.unwrap_or(0)),
    }
}

/// Byte orders of the length field and checksum for frames of this mode
#[must_use]
pub fn field_endians(schema: &ValidSchema, length: &LengthSchema) -> FieldEndians {
    FieldEndians {
        length: match length {
            LengthSchema::Dynamic(dynamic) => dynamic.endian(),
            LengthSchema::Fixed { .. } | LengthSchema::Free => Endian::default(),
        },
        crc: schema.crc_endian(),
    }
}

/// Segment layout of a frame with `content_len` bytes of content
#[must_use]
pub fn layout(schema: &ValidSchema, length: &LengthSchema, content_len: usize) -> Segments {
    let mut segments = Segments::default();
    let mut offset = 0;
    for kind in SegmentKind::ALL {
        let len = match kind {
            SegmentKind::Content => content_len,
            _ => segment_width(schema, length, kind),
        };
        segments.set(kind, Segment::new(offset, len));
        offset += len;
    }
    segments
}
