//! Frame schema, codec and incremental decoder
//!
//! This module holds the wire model ([`FrameSchema`], [`Frame`]), the
//! stateless encoder and the resumable decoder.

mod codec;
mod decoder;
mod error;
mod frame;
pub mod geometry;
mod schema;
mod types;

pub use codec::{Encoder, encode, encode_content};
pub use decoder::{Decoder, DecoderConfig, DecoderStats, ResyncReason, Stage};
pub use error::{Error, Result, SchemaError};
pub use frame::{FieldEndians, Frame, FrameMut, FrameView};
pub use schema::{DynamicLength, FrameSchema, LengthOverride, LengthSchema, ValidSchema};
pub use types::{Endian, FieldRange, Segment, SegmentKind, Segments};

/// Widest supported command, alterData or checksum field, in bytes
pub const MAX_FIELD_SIZE: usize = 4;

/// Default cap on a single frame, in bytes
pub const DEFAULT_MAX_PACKAGE_SIZE: usize = 1024;
