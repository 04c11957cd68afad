//! Frame schema: the declarative description of a wire layout
//!
//! A [`FrameSchema`] is plain configuration. [`FrameSchema::normalize`]
//! checks its invariants once and yields a [`ValidSchema`], which the
//! encoder and decoder share.

use std::ops::Deref;
use std::sync::Arc;

use super::error::SchemaError;
use super::types::{Endian, FieldRange};
use super::MAX_FIELD_SIZE;

/// Dynamic length field parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynamicLength {
    /// Width of the length field: 1, 2 or 4 bytes
    pub size: usize,
    /// Byte order of the length field, big-endian when unset
    #[cfg_attr(feature = "serde", serde(default))]
    pub endian: Option<Endian>,
    /// Segments counted by the length value, content only when unset
    #[cfg_attr(feature = "serde", serde(default))]
    pub range: Option<FieldRange>,
}

impl DynamicLength {
    /// Big-endian length field covering the content only
    #[must_use]
    pub const fn new(size: usize) -> Self {
        Self {
            size,
            endian: None,
            range: None,
        }
    }

    /// Set the byte order
    #[must_use]
    pub const fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = Some(endian);
        self
    }

    /// Set the segments counted by the length value
    #[must_use]
    pub const fn with_range(mut self, range: FieldRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Effective byte order
    #[must_use]
    pub fn endian(&self) -> Endian {
        self.endian.unwrap_or_default()
    }

    /// Effective coverage
    #[must_use]
    pub fn range(&self) -> FieldRange {
        self.range.unwrap_or(FieldRange::CONTENT)
    }

    /// Largest value the field can carry
    #[must_use]
    pub const fn max_value(&self) -> u64 {
        if self.size >= 8 {
            u64::MAX
        } else {
            (1u64 << (self.size * 8)) - 1
        }
    }
}

/// How the content length of a frame is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "mode", rename_all = "lowercase")
)]
pub enum LengthSchema {
    /// Content length is a constant
    Fixed {
        /// Content length in bytes
        length: usize,
    },
    /// Content length is carried in a binary length field
    Dynamic(DynamicLength),
    /// No length field, content ends at the suffix
    Free,
}

impl LengthSchema {
    /// Mode name, for diagnostics
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Dynamic(_) => "dynamic",
            Self::Free => "free",
        }
    }

    /// Check whether this is free mode
    #[must_use]
    pub const fn is_free(&self) -> bool {
        matches!(self, Self::Free)
    }
}

/// Length schema applied to commands starting with `command`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LengthOverride {
    /// Leading command bytes to match
    pub command: Vec<u8>,
    /// Length schema for matching commands
    pub length: LengthSchema,
}

/// Declarative frame layout
///
/// # Wire Format
///
/// ```text
/// fixed   : |  prefix  | (cmd) |        | (alterData) | (content) | (crc) | (suffix) |
/// dynamic : |  prefix  | (cmd) | length | (alterData) | (content) | (crc) | (suffix) |
/// free    : | (prefix) | (cmd) |        | (alterData) |  content  |       |  suffix  |
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct FrameSchema {
    /// Leading marker, empty for none
    pub prefix: Vec<u8>,
    /// Width of the command field (0..=4)
    pub command_size: usize,
    /// Per-command length schemas, first match wins
    pub length_overrides: Vec<LengthOverride>,
    /// Length schema used when no override matches
    pub default_length: LengthSchema,
    /// Width of the header extension (0..=4)
    pub alter_data_size: usize,
    /// Width of the checksum region (0..=4)
    pub crc_size: usize,
    /// Byte order of the checksum, big-endian when unset
    pub crc_endian: Option<Endian>,
    /// Segments a checksum covers, content only when unset
    pub crc_range: Option<FieldRange>,
    /// Trailing marker, empty for none
    pub suffix: Vec<u8>,
}

impl Default for FrameSchema {
    fn default() -> Self {
        Self::new(LengthSchema::Free)
    }
}

impl FrameSchema {
    /// Create a schema with only a default length schema
    #[must_use]
    pub const fn new(default_length: LengthSchema) -> Self {
        Self {
            prefix: Vec::new(),
            command_size: 0,
            length_overrides: Vec::new(),
            default_length,
            alter_data_size: 0,
            crc_size: 0,
            crc_endian: None,
            crc_range: None,
            suffix: Vec::new(),
        }
    }

    /// Set the leading marker
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the command width
    #[must_use]
    pub fn with_command_size(mut self, size: usize) -> Self {
        self.command_size = size;
        self
    }

    /// Append a per-command length override
    #[must_use]
    pub fn with_override(mut self, command: impl Into<Vec<u8>>, length: LengthSchema) -> Self {
        self.length_overrides.push(LengthOverride {
            command: command.into(),
            length,
        });
        self
    }

    /// Set the header extension width
    #[must_use]
    pub fn with_alter_data_size(mut self, size: usize) -> Self {
        self.alter_data_size = size;
        self
    }

    /// Set the checksum width and byte order
    #[must_use]
    pub fn with_crc(mut self, size: usize, endian: Endian) -> Self {
        self.crc_size = size;
        self.crc_endian = Some(endian);
        self
    }

    /// Set the segments a checksum covers
    #[must_use]
    pub fn with_crc_range(mut self, range: FieldRange) -> Self {
        self.crc_range = Some(range);
        self
    }

    /// Set the trailing marker
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<Vec<u8>>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Fill default byte orders and check every invariant.
    ///
    /// The default length schema and every override are validated.
    pub fn normalize(mut self) -> Result<ValidSchema, SchemaError> {
        check_width("command", self.command_size)?;
        check_width("alterData", self.alter_data_size)?;
        check_width("crc", self.crc_size)?;

        if !self.length_overrides.is_empty() && self.command_size == 0 {
            return Err(SchemaError::OverridesWithoutCommand);
        }
        for entry in &self.length_overrides {
            if entry.command.is_empty() || entry.command.len() > self.command_size {
                return Err(SchemaError::InvalidCommandPattern {
                    len: entry.command.len(),
                    command_size: self.command_size,
                });
            }
        }

        self.crc_endian.get_or_insert_default();
        self.crc_range.get_or_insert(FieldRange::CONTENT);

        let mut default_length = self.default_length;
        self.check_length(&mut default_length)?;
        self.default_length = default_length;

        let mut overrides = std::mem::take(&mut self.length_overrides);
        for entry in &mut overrides {
            self.check_length(&mut entry.length)?;
        }
        self.length_overrides = overrides;

        Ok(ValidSchema(Arc::new(self)))
    }

    fn check_length(&self, length: &mut LengthSchema) -> Result<(), SchemaError> {
        match length {
            LengthSchema::Fixed { .. } => {
                if self.prefix.is_empty() {
                    return Err(SchemaError::MissingPrefix { mode: "fixed" });
                }
            }
            LengthSchema::Dynamic(dynamic) => {
                if self.prefix.is_empty() {
                    return Err(SchemaError::MissingPrefix { mode: "dynamic" });
                }
                if !matches!(dynamic.size, 1 | 2 | 4) {
                    return Err(SchemaError::InvalidLengthSize { size: dynamic.size });
                }
                dynamic.endian.get_or_insert_default();
                dynamic.range.get_or_insert(FieldRange::CONTENT);
            }
            LengthSchema::Free => {
                if self.suffix.is_empty() {
                    return Err(SchemaError::MissingSuffix);
                }
                if self.crc_size != 0 {
                    return Err(SchemaError::ChecksumInFreeMode {
                        crc_size: self.crc_size,
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_width(field: &'static str, size: usize) -> Result<(), SchemaError> {
    if size > MAX_FIELD_SIZE {
        return Err(SchemaError::FieldTooWide {
            field,
            size,
            max: MAX_FIELD_SIZE,
        });
    }
    Ok(())
}

impl TryFrom<FrameSchema> for ValidSchema {
    type Error = SchemaError;

    fn try_from(schema: FrameSchema) -> Result<Self, Self::Error> {
        schema.normalize()
    }
}

/// Normalized, immutable frame schema
///
/// Clones share the same schema, so an encoder and a decoder built from one
/// `ValidSchema` always agree on the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSchema(Arc<FrameSchema>);

impl ValidSchema {
    /// Length schema for a frame carrying `command`.
    ///
    /// Overrides are scanned in declaration order and the first whose pattern
    /// matches the leading command bytes wins. Without a command, or with no
    /// matching override, the default length schema applies.
    #[must_use]
    pub fn resolve_length(&self, command: Option<&[u8]>) -> &LengthSchema {
        let Some(command) = command else {
            return &self.0.default_length;
        };
        self.0
            .length_overrides
            .iter()
            .find(|entry| command.starts_with(&entry.command))
            .map_or(&self.0.default_length, |entry| &entry.length)
    }

    /// Effective checksum byte order
    #[must_use]
    pub fn crc_endian(&self) -> Endian {
        self.0.crc_endian.unwrap_or_default()
    }

    /// Effective checksum coverage
    #[must_use]
    pub fn crc_range(&self) -> FieldRange {
        self.0.crc_range.unwrap_or(FieldRange::CONTENT)
    }

    /// Check whether two handles share one schema instance
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ValidSchema {
    type Target = FrameSchema;

    fn deref(&self) -> &FrameSchema {
        &self.0
    }
}
