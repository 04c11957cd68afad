//! Newline-delimited `key=value` parser
//!
//! Each line is a comma-separated list of `key=value` items. Items without
//! exactly one `=` are ignored, as are lines left with no items.

use std::collections::BTreeMap;

use tracing::trace;

use super::parser::ProtocolParser;
use crate::protocol::Result;

/// One parsed line
pub type Record = BTreeMap<String, String>;

/// Incremental parser for `key=value` lines
#[derive(Debug, Default, Clone)]
pub struct AsciiParser {
    buffer: String,
    search_from: usize,
}

impl AsciiParser {
    /// Create an empty parser
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes buffered and not yet parsed
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn parse_line(line: &str) -> Record {
        line.trim()
            .split(',')
            .filter_map(|item| {
                let mut parts = item.trim().split('=');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(key), Some(value), None) => Some((key.to_owned(), value.to_owned())),
                    _ => None,
                }
            })
            .collect()
    }
}

impl ProtocolParser for AsciiParser {
    type Input = str;
    type Output = Record;

    fn feed(&mut self, data: &str) -> Result<()> {
        self.buffer.push_str(data);
        Ok(())
    }

    fn parse(&mut self) -> Option<Record> {
        loop {
            let Some(found) = self.buffer[self.search_from..].find('\n') else {
                self.search_from = self.buffer.len();
                return None;
            };
            let end = self.search_from + found;
            let record = Self::parse_line(&self.buffer[..end]);
            self.buffer.drain(..=end);
            self.search_from = 0;
            if record.is_empty() {
                trace!("skipping line without key=value items");
                continue;
            }
            return Some(record);
        }
    }
}
