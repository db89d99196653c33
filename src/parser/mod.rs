//! Header parsing: the parser trait and the bundled C parser.

pub mod c;

use crate::model::Record;
use anyhow::Result;

/// Turns the text of one header into an ordered sequence of records.
///
/// `path` is the header path relative to the checked-out subtree root and
/// becomes the `file` of every record produced.
pub trait HeaderParser {
    fn parse(&self, path: &str, content: &str) -> Result<Vec<Record>>;
}

/// File extension of the headers fed to a [`HeaderParser`].
pub const HEADER_EXTENSION: &str = "h";
