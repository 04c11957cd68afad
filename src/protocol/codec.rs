//! Frame encoder
//!
//! Encoding is a pure function of the schema, the command and the content
//! length. Every statically known byte is written up front; the payload
//! regions are left zeroed for the caller.

use tracing::trace;

use super::error::{Error, Result};
use super::frame::FrameMut;
use super::geometry::{
    dynamic_length_overhead, field_endians, layout, resolve_content_len, total_frame_length,
};
use super::schema::{DynamicLength, FrameSchema, LengthSchema, ValidSchema};
use super::types::SegmentKind;

/// Build a frame for `command` with room for `content_len` bytes of content
///
/// # Format
///
/// ```text
/// [PREFIX] [COMMAND] [LENGTH] [ALTERDATA] [CONTENT] [CRC] [SUFFIX]
/// ```
///
/// Absent fields take no space. A fixed length schema supplies the content
/// length itself; passing a different one is an error.
///
/// # Errors
///
/// Returns an error if:
/// - `command` is not exactly `command_size` bytes
/// - `content_len` disagrees with a fixed length schema
/// - the length value does not fit in the dynamic length field
pub fn encode(
    schema: &ValidSchema,
    command: Option<&[u8]>,
    content_len: Option<usize>,
) -> Result<FrameMut> {
    if let Some(command) = command {
        if schema.command_size > 0 && command.len() != schema.command_size {
            return Err(Error::CommandSizeMismatch {
                expected: schema.command_size,
                got: command.len(),
            });
        }
    }

    let length = schema.resolve_length(command);
    let content_len = resolve_content_len(length, content_len)?;
    let length_value = match length {
        LengthSchema::Dynamic(dynamic) => Some(length_field_value(schema, dynamic, content_len)?),
        LengthSchema::Fixed { .. } | LengthSchema::Free => None,
    };
    let total = total_frame_length(schema, length, Some(content_len))?;
    let segments = layout(schema, length, content_len);
    let mut frame = FrameMut::zeroed(segments, total, field_endians(schema, length));

    if !schema.prefix.is_empty() {
        frame
            .segment_mut(SegmentKind::Prefix)
            .copy_from_slice(&schema.prefix);
    }

    if let Some(command) = command {
        if schema.command_size > 0 {
            frame
                .segment_mut(SegmentKind::Command)
                .copy_from_slice(command);
        }
    }

    if let (LengthSchema::Dynamic(dynamic), Some(value)) = (length, length_value) {
        frame.put_uint(SegmentKind::Length, value, dynamic.endian());
    }

    if !schema.suffix.is_empty() {
        frame
            .segment_mut(SegmentKind::Suffix)
            .copy_from_slice(&schema.suffix);
    }

    trace!(
        mode = length.mode(),
        content_len,
        total,
        "encoded frame"
    );
    Ok(frame)
}

/// Length field value for `content_len`, checked against the field width
fn length_field_value(
    schema: &ValidSchema,
    dynamic: &DynamicLength,
    content_len: usize,
) -> Result<u64> {
    let overflow = || Error::LengthFieldOverflow {
        value: content_len.saturating_add(dynamic_length_overhead(schema, dynamic)),
        size: dynamic.size,
    };
    let value = content_len
        .checked_add(dynamic_length_overhead(schema, dynamic))
        .ok_or_else(overflow)?;
    match u64::try_from(value) {
        Ok(value) if value <= dynamic.max_value() => Ok(value),
        _ => Err(overflow()),
    }
}

/// Build a frame and copy `content` into it
pub fn encode_content(
    schema: &ValidSchema,
    command: Option<&[u8]>,
    content: &[u8],
) -> Result<FrameMut> {
    let mut frame = encode(schema, command, Some(content.len()))?;
    frame.set_content(content)?;
    Ok(frame)
}

/// Stateless frame builder bound to one schema
#[derive(Debug, Clone)]
pub struct Encoder {
    schema: ValidSchema,
}

impl Encoder {
    /// Create an encoder, validating the schema
    pub fn new(schema: FrameSchema) -> Result<Self> {
        Ok(Self::with_schema(schema.normalize()?))
    }

    /// Create an encoder sharing an already validated schema
    #[must_use]
    pub fn with_schema(schema: ValidSchema) -> Self {
        Self { schema }
    }

    /// Schema used by this encoder
    #[must_use]
    pub fn schema(&self) -> &ValidSchema {
        &self.schema
    }

    /// Build a frame, see [`encode`]
    pub fn encode(&self, command: Option<&[u8]>, content_len: Option<usize>) -> Result<FrameMut> {
        encode(&self.schema, command, content_len)
    }

    /// Build a frame holding `content`, see [`encode_content`]
    pub fn encode_content(&self, command: Option<&[u8]>, content: &[u8]) -> Result<FrameMut> {
        encode_content(&self.schema, command, content)
    }
}
