//! Frameshift - schema-driven framing for binary byte streams
//!
//! A [`FrameSchema`] describes a frame as up to seven contiguous segments:
//!
//! ```text
//! [PREFIX] [COMMAND] [LENGTH] [ALTERDATA] [CONTENT] [CRC] [SUFFIX]
//! ```
//!
//! The same schema drives an [`Encoder`] that lays out outgoing frames and a
//! resumable [`Decoder`] that pulls frames out of an arbitrarily chunked,
//! possibly corrupted input stream.
//!
//! # Quick Start
//!
//! ```rust
//! use frameshift::{Decoder, DecoderConfig, DynamicLength, Encoder, FrameSchema, FrameView, LengthSchema};
//!
//! let schema = FrameSchema::new(LengthSchema::Dynamic(DynamicLength::new(1)))
//!     .with_prefix([0xFF, 0xFE])
//!     .with_command_size(1)
//!     .with_suffix([0xCC])
//!     .normalize()?;
//!
//! let encoder = Encoder::with_schema(schema.clone());
//! let frame = encoder.encode_content(Some(&[0x01]), b"hello")?.freeze();
//!
//! let mut decoder = Decoder::new(schema, DecoderConfig::default())?;
//! decoder.feed(&[0x00, 0x13])?;
//! decoder.feed(frame.as_bytes())?;
//!
//! let decoded = decoder.parse().expect("one frame");
//! assert_eq!(decoded.content(), b"hello");
//! # Ok::<(), frameshift::Error>(())
//! ```
//!
//! # Features
//!
//! - **Three length modes** - fixed, dynamic length field, or suffix-delimited
//! - **Per-command lengths** - overrides keyed on command prefixes
//! - **Self-synchronizing decoder** - garbage and corrupt frames are skipped
//! - **Checksum agnostic** - the codec reserves and exposes the checksum
//!   region but never computes it
//! - **`serde` feature** - load schemas from any serde format

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod protocol;
pub mod stream;

pub use protocol::{
    Decoder, DecoderConfig, DecoderStats, DynamicLength, Encoder, Endian, Error, FieldEndians,
    FieldRange, Frame, FrameMut, FrameSchema, FrameView, LengthOverride, LengthSchema,
    ResyncReason, Result, SchemaError, Segment, SegmentKind, Segments, Stage, ValidSchema,
    DEFAULT_MAX_PACKAGE_SIZE, MAX_FIELD_SIZE, encode, encode_content,
};
pub use stream::{AsciiParser, ByteRing, ProtocolParser, RingBuffer};
