//! Frameshift error types

use thiserror::Error;

/// Schema invariant violations, reported when a schema is normalized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Fixed and dynamic length modes need a prefix to anchor the frame
    #[error("{mode} length schema requires a non-empty prefix")]
    MissingPrefix {
        /// Offending length mode
        mode: &'static str,
    },

    /// Free length mode needs a suffix to find the end of the content
    #[error("free length schema requires a non-empty suffix")]
    MissingSuffix,

    /// Free length mode cannot locate a checksum region
    #[error("free length schema does not support a checksum (crc size {crc_size})")]
    ChecksumInFreeMode {
        /// Configured checksum width
        crc_size: usize,
    },

    /// Per-command length overrides were given without a command field
    #[error("per-command length overrides require a non-zero command size")]
    OverridesWithoutCommand,

    /// A fixed-width field is wider than the codec supports
    #[error("{field} size {size} exceeds the maximum of {max} bytes")]
    FieldTooWide {
        /// Field name
        field: &'static str,
        /// Configured width
        size: usize,
        /// Largest supported width
        max: usize,
    },

    /// Dynamic length fields are 1, 2 or 4 bytes wide
    #[error("dynamic length size must be 1, 2 or 4 bytes, got {size}")]
    InvalidLengthSize {
        /// Configured width
        size: usize,
    },

    /// An override pattern cannot match a command of the configured width
    #[error("command pattern of {len} bytes does not fit a {command_size}-byte command")]
    InvalidCommandPattern {
        /// Pattern length
        len: usize,
        /// Configured command width
        command_size: usize,
    },
}

/// Frameshift errors
#[derive(Error, Debug)]
pub enum Error {
    /// The frame schema is self-contradictory
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    /// Caller-supplied content length disagrees with a fixed length schema
    #[error("content length {got} does not match fixed length {expected}")]
    LengthMismatch {
        /// Length required by the schema
        expected: usize,
        /// Length supplied by the caller
        got: usize,
    },

    /// Encoded length value does not fit in the length field
    #[error("length value {value} does not fit in a {size}-byte length field")]
    LengthFieldOverflow {
        /// Value that would be written
        value: usize,
        /// Width of the length field
        size: usize,
    },

    /// Frame size is not representable in memory
    #[error("frame with {content_len} bytes of content is too large")]
    FrameTooLarge {
        /// Requested content length
        content_len: usize,
    },

    /// Command bytes do not match the configured command width
    #[error("command is {got} bytes, schema expects {expected}")]
    CommandSizeMismatch {
        /// Configured command width
        expected: usize,
        /// Supplied command length
        got: usize,
    },

    /// Bytes written into a segment do not match its size
    #[error("segment holds {expected} bytes, got {got}")]
    ContentSizeMismatch {
        /// Segment size
        expected: usize,
        /// Supplied length
        got: usize,
    },

    /// Ring buffer cannot hold the appended bytes
    #[error("buffer full: need {needed} bytes, {available} available")]
    BufferFull {
        /// Bytes the caller tried to append
        needed: usize,
        /// Free space left in the buffer
        available: usize,
    },

    /// Invalid decoder configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
