//! Incremental frame decoder
//!
//! The decoder keeps its input in a [`ByteRing`] and walks a fixed sequence
//! of stages over it. Each stage either advances, stalls for more input, or
//! asks for a resync. A stall keeps all progress, so a frame may arrive in
//! any number of chunks.

use tracing::{debug, instrument, trace};

use super::error::{Error, Result};
use super::frame::{Frame, FrameView};
use super::geometry::{content_overhead, dynamic_length_overhead, field_endians};
use super::schema::{FrameSchema, LengthSchema, ValidSchema};
use super::types::{Segment, SegmentKind, Segments};
use super::DEFAULT_MAX_PACKAGE_SIZE;
use crate::stream::{ByteRing, ProtocolParser, RingBuffer};

/// Decoder configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DecoderConfig {
    /// Largest frame, in bytes, the decoder will assemble. Also the input
    /// buffer capacity.
    pub max_package_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_package_size: DEFAULT_MAX_PACKAGE_SIZE,
        }
    }
}

impl DecoderConfig {
    /// Configuration with the given frame size cap
    #[must_use]
    pub const fn new(max_package_size: usize) -> Self {
        Self { max_package_size }
    }

    fn validate(&self) -> Result<()> {
        if self.max_package_size == 0 {
            return Err(Error::InvalidConfig("max_package_size must be positive"));
        }
        Ok(())
    }
}

/// Decoder stage, in transition order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Start over on the current buffer
    Init,
    /// Clear per-frame state
    Preparing,
    /// Looking for the prefix marker
    SeekingPrefix,
    /// Reading the command
    ParsingCommand,
    /// Determining the content length
    ParsingLength,
    /// Skipping the header extension
    ParsingAlterData,
    /// Skipping the content, or marking its start in free mode
    SeekingContent,
    /// Skipping the checksum
    SeekingCrc,
    /// Matching or scanning for the suffix marker
    MatchingSuffix,
    /// Frame fully delimited
    Done,
}

/// Why a frame attempt was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncReason {
    /// Bytes after the checksum were not the suffix
    SuffixMismatch,
    /// Declared frame size exceeds the cap
    Oversized,
    /// Length value smaller than the segments it claims to cover
    LengthUnderflow,
    /// Free-mode scan passed the cap without finding a suffix
    SuffixNotFound,
}

/// Counters for one decoder instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames produced
    pub frames: u64,
    /// Frame attempts abandoned
    pub resyncs: u64,
    /// Input bytes dropped without becoming part of a frame
    pub discarded_bytes: u64,
}

/// Outcome of running one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Advance(Stage),
    Stall,
    Resync(ResyncReason),
    Complete,
}

/// Resumable decoder turning a byte stream into frames
#[derive(Debug)]
pub struct Decoder<R = RingBuffer> {
    schema: ValidSchema,
    config: DecoderConfig,
    ring: R,
    stage: Stage,
    cursor: usize,
    segments: Segments,
    length: LengthSchema,
    content_len: usize,
    overhead: usize,
    content_start: usize,
    stats: DecoderStats,
}

impl Decoder<RingBuffer> {
    /// Create a decoder with a ring sized to `max_package_size`
    pub fn new(schema: ValidSchema, config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        let ring = RingBuffer::new(config.max_package_size);
        Self::with_ring(schema, config, ring)
    }

    /// Validate `schema` and create a decoder for it
    pub fn from_schema(schema: FrameSchema, config: DecoderConfig) -> Result<Self> {
        Self::new(schema.normalize()?, config)
    }
}

impl<R: ByteRing> Decoder<R> {
    /// Create a decoder over a caller-supplied ring
    pub fn with_ring(schema: ValidSchema, config: DecoderConfig, ring: R) -> Result<Self> {
        config.validate()?;
        if ring.capacity() < config.max_package_size {
            return Err(Error::InvalidConfig(
                "ring capacity is smaller than max_package_size",
            ));
        }
        let length = schema.default_length;
        Ok(Self {
            schema,
            config,
            ring,
            stage: Stage::Init,
            cursor: 0,
            segments: Segments::default(),
            length,
            content_len: 0,
            overhead: 0,
            content_start: 0,
            stats: DecoderStats::default(),
        })
    }

    /// Schema this decoder parses; hand it to the encoder for the other direction
    #[must_use]
    pub fn schema(&self) -> &ValidSchema {
        &self.schema
    }

    /// Decoder configuration
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Counters since construction
    #[must_use]
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Current stage
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Bytes buffered and not yet consumed
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.ring.len()
    }

    /// Append input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferFull`] if the chunk does not fit; nothing is
    /// appended in that case.
    pub fn feed(&mut self, data: &[u8]) -> Result<()> {
        self.ring.append(data).inspect_err(|err| {
            debug!(error = %err, "input rejected");
        })
    }

    /// Append as much of `data` as fits and return how many bytes were taken
    pub fn push(&mut self, data: &[u8]) -> usize {
        let take = data.len().min(self.ring.available());
        let appended = self.ring.append(&data[..take]);
        debug_assert!(appended.is_ok(), "append within available space failed");
        take
    }

    /// Abandon the frame in flight; the next parse starts over on the
    /// buffered bytes
    pub fn reset(&mut self) {
        self.stage = Stage::Init;
    }

    /// Drop all buffered input and start over
    pub fn clear(&mut self) {
        let len = self.ring.len();
        self.ring.discard(len);
        self.stage = Stage::Init;
    }

    /// Run the state machine as far as the buffered bytes allow.
    ///
    /// Returns the next complete frame, or `None` when more input is needed.
    /// Call repeatedly to drain every buffered frame.
    #[instrument(level = "trace", skip(self), fields(buffered = self.ring.len()))]
    pub fn parse(&mut self) -> Option<Frame> {
        loop {
            match self.step() {
                Step::Advance(next) => self.stage = next,
                Step::Stall => return None,
                Step::Resync(reason) => self.resync(reason),
                Step::Complete => return Some(self.finish()),
            }
        }
    }

    fn step(&mut self) -> Step {
        match self.stage {
            Stage::Init => {
                self.cursor = 0;
                Step::Advance(Stage::Preparing)
            }
            Stage::Preparing => {
                self.segments = Segments::default();
                self.length = self.schema.default_length;
                self.content_len = 0;
                self.overhead = 0;
                self.content_start = 0;
                Step::Advance(Stage::SeekingPrefix)
            }
            Stage::SeekingPrefix => self.seek_prefix(),
            Stage::ParsingCommand => {
                self.take(SegmentKind::Command, self.schema.command_size, Stage::ParsingLength)
            }
            Stage::ParsingLength => self.parse_length(),
            Stage::ParsingAlterData => self.take(
                SegmentKind::AlterData,
                self.schema.alter_data_size,
                Stage::SeekingContent,
            ),
            Stage::SeekingContent => {
                if self.length.is_free() {
                    self.content_start = self.cursor;
                    Step::Advance(Stage::MatchingSuffix)
                } else {
                    self.take(SegmentKind::Content, self.content_len, Stage::SeekingCrc)
                }
            }
            Stage::SeekingCrc => {
                self.take(SegmentKind::Crc, self.schema.crc_size, Stage::MatchingSuffix)
            }
            Stage::MatchingSuffix => {
                if self.length.is_free() {
                    self.scan_suffix()
                } else {
                    self.match_suffix()
                }
            }
            Stage::Done => Step::Complete,
        }
    }

    /// Record the next `len` bytes as segment `kind`
    fn take(&mut self, kind: SegmentKind, len: usize, next: Stage) -> Step {
        if self.cursor + len > self.ring.len() {
            return Step::Stall;
        }
        self.segments.set(kind, Segment::new(self.cursor, len));
        self.cursor += len;
        Step::Advance(next)
    }

    fn seek_prefix(&mut self) -> Step {
        let prefix_len = self.schema.prefix.len();
        if prefix_len == 0 {
            return Step::Advance(Stage::ParsingCommand);
        }
        match self.ring.find(self.cursor, &self.schema.prefix) {
            Ok(position) => {
                self.discard(position);
                self.segments
                    .set(SegmentKind::Prefix, Segment::new(0, prefix_len));
                self.cursor = prefix_len;
                Step::Advance(Stage::ParsingCommand)
            }
            Err(scanned) => {
                // nothing before `scanned` can start a prefix
                self.discard(scanned);
                Step::Stall
            }
        }
    }

    fn parse_length(&mut self) -> Step {
        let command_segment = self.segments.get(SegmentKind::Command);
        let command = if command_segment.is_empty() {
            None
        } else {
            self.ring
                .peek_slice(command_segment.offset, command_segment.len)
        };
        self.length = *self.schema.resolve_length(command.as_deref());
        self.overhead = content_overhead(&self.schema, &self.length);

        match self.length {
            LengthSchema::Fixed { length } => self.content_len = length,
            LengthSchema::Dynamic(dynamic) => {
                let Some(raw) = self.ring.peek_slice(self.cursor, dynamic.size) else {
                    return Step::Stall;
                };
                let value = usize::try_from(dynamic.endian().read_uint(&raw)).unwrap_or(usize::MAX);
                let Some(content_len) =
                    value.checked_sub(dynamic_length_overhead(&self.schema, &dynamic))
                else {
                    return Step::Resync(ResyncReason::LengthUnderflow);
                };
                self.content_len = content_len;
            }
            LengthSchema::Free => {}
        }

        if self.content_len.saturating_add(self.overhead) > self.config.max_package_size {
            return Step::Resync(ResyncReason::Oversized);
        }
        let width = match self.length {
            LengthSchema::Dynamic(dynamic) => dynamic.size,
            LengthSchema::Fixed { .. } | LengthSchema::Free => 0,
        };
        self.segments
            .set(SegmentKind::Length, Segment::new(self.cursor, width));
        self.cursor += width;
        Step::Advance(Stage::ParsingAlterData)
    }

    fn match_suffix(&mut self) -> Step {
        let suffix = &self.schema.suffix;
        match self.ring.matches_at(self.cursor, suffix) {
            None => Step::Stall,
            Some(false) => Step::Resync(ResyncReason::SuffixMismatch),
            Some(true) => {
                self.segments
                    .set(SegmentKind::Suffix, Segment::new(self.cursor, suffix.len()));
                self.cursor += suffix.len();
                Step::Advance(Stage::Done)
            }
        }
    }

    fn scan_suffix(&mut self) -> Step {
        let suffix_len = self.schema.suffix.len();
        match self.ring.find(self.cursor, &self.schema.suffix) {
            Ok(position) => {
                self.content_len = position - self.content_start;
                if self.content_len + self.overhead > self.config.max_package_size {
                    return Step::Resync(ResyncReason::Oversized);
                }
                self.segments.set(
                    SegmentKind::Content,
                    Segment::new(self.content_start, self.content_len),
                );
                self.segments
                    .set(SegmentKind::Crc, Segment::new(position, 0));
                self.segments
                    .set(SegmentKind::Suffix, Segment::new(position, suffix_len));
                self.cursor = position + suffix_len;
                Step::Advance(Stage::Done)
            }
            Err(scanned) => {
                self.cursor = scanned;
                if scanned - self.content_start + self.overhead > self.config.max_package_size {
                    Step::Resync(ResyncReason::SuffixNotFound)
                } else {
                    Step::Stall
                }
            }
        }
    }

    fn finish(&mut self) -> Frame {
        let buf = self.ring.consume(self.cursor);
        let frame = Frame::from_parts(buf, self.segments)
            .with_endians(field_endians(&self.schema, &self.length));
        self.cursor = 0;
        self.stage = Stage::Preparing;
        self.stats.frames += 1;
        trace!(
            mode = self.length.mode(),
            len = frame.wire_size(),
            content_len = self.content_len,
            "decoded frame"
        );
        frame
    }

    fn resync(&mut self, reason: ResyncReason) {
        debug!(
            ?reason,
            stage = ?self.stage,
            buffered = self.ring.len(),
            "frame rejected, resyncing"
        );
        self.ring.discard(1);
        self.stats.resyncs += 1;
        self.stats.discarded_bytes += 1;
        self.cursor = 0;
        self.stage = Stage::Preparing;
    }

    fn discard(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        trace!(len, "discarding bytes before prefix");
        self.ring.discard(len);
        self.stats.discarded_bytes += len as u64;
        self.cursor = self.cursor.saturating_sub(len);
    }
}

impl<R: ByteRing> ProtocolParser for Decoder<R> {
    type Input = [u8];
    type Output = Frame;

    fn feed(&mut self, data: &[u8]) -> Result<()> {
        Decoder::feed(self, data)
    }

    fn parse(&mut self) -> Option<Frame> {
        Decoder::parse(self)
    }

    /// Feed a chunk of any size, draining frames whenever the ring fills up
    fn transform(&mut self, mut chunk: &[u8]) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        loop {
            let accepted = self.push(chunk);
            chunk = &chunk[accepted..];
            frames.extend(self.drain());
            if chunk.is_empty() {
                return Ok(frames);
            }
            if accepted == 0 && self.ring.available() == 0 {
                return Err(Error::BufferFull {
                    needed: chunk.len(),
                    available: 0,
                });
            }
        }
    }
}
