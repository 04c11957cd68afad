//! Stream plumbing: input buffering and the chunk-transform boundary

mod ascii;
mod parser;
mod ring;

pub use ascii::{AsciiParser, Record};
pub use parser::{Drain, ProtocolParser};
pub use ring::{ByteRing, RingBuffer};
