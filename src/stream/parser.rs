//! Chunk-transform boundary shared by every parser in the crate.

use crate::protocol::Result;

/// Incremental parser over a chunked input stream.
///
/// Callers [`feed`](Self::feed) input as it arrives and call
/// [`parse`](Self::parse) until it returns `None`. [`transform`](Self::transform)
/// bundles the two for pipeline-style use.
pub trait ProtocolParser {
    /// Chunk type accepted by [`feed`](Self::feed)
    type Input: ?Sized;

    /// Item produced by [`parse`](Self::parse)
    type Output;

    /// Buffer a chunk of input
    fn feed(&mut self, data: &Self::Input) -> Result<()>;

    /// Next complete item, or `None` when more input is needed
    fn parse(&mut self) -> Option<Self::Output>;

    /// Iterator over every item currently available
    fn drain(&mut self) -> Drain<'_, Self>
    where
        Self: Sized,
    {
        Drain { parser: self }
    }

    /// Feed a chunk and collect everything it completes
    fn transform(&mut self, chunk: &Self::Input) -> Result<Vec<Self::Output>>
    where
        Self: Sized,
    {
        self.feed(chunk)?;
        Ok(self.drain().collect())
    }
}

/// Iterator returned by [`ProtocolParser::drain`]
#[derive(Debug)]
pub struct Drain<'a, P> {
    parser: &'a mut P,
}

impl<P: ProtocolParser> Iterator for Drain<'_, P> {
    type Item = P::Output;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.parse()
    }
}
