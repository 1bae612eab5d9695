//! Sources of term statistics.
//!
//! The text format read by [`TextIdfReader`]:
//!
//! ```text
//! #documents 1000
//! #length title 4200
//! #length body 98000
//! rust	12
//! search	340
//! ```
//!
//! Header lines come first: exactly one `#documents <n>` with `n > 0`, and
//! any number of `#length <field> <sum>`. Then one `term<TAB>df` per line.
//! Blank lines are skipped anywhere.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::num::NonZeroU64;
use std::path::Path;

use tracing::debug;

use crate::error::IdfError;

/// Sequential source of `(term, document frequency)` entries.
pub trait IdfReader {
    /// Number of documents in the collection.
    fn document_count(&self) -> NonZeroU64;

    /// Sum of document lengths per field.
    fn lengths(&self) -> &BTreeMap<String, u64>;

    /// Next entry, or `None` once the feed is exhausted.
    fn next_entry(&mut self) -> Result<Option<(String, u64)>, IdfError>;
}

/// [`IdfReader`] over the line-oriented text format.
#[derive(Debug)]
pub struct TextIdfReader<R> {
    lines: Lines<R>,
    line_no: usize,
    document_count: NonZeroU64,
    lengths: BTreeMap<String, u64>,
    pending: Option<(String, u64)>,
}

impl TextIdfReader<BufReader<File>> {
    /// Open a statistics file.
    ///
    /// # Errors
    ///
    /// Returns [`IdfError::Io`] if the file cannot be opened, or any header
    /// error from [`TextIdfReader::new`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IdfError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening term statistics");
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: BufRead> TextIdfReader<R> {
    /// Read the header section.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is missing, malformed or declares
    /// zero documents.
    pub fn new(reader: R) -> Result<Self, IdfError> {
        let mut lines = reader.lines();
        let mut line_no = 0;
        let mut document_count = None;
        let mut lengths = BTreeMap::new();
        let mut pending = None;

        for line in lines.by_ref() {
            let line = line?;
            line_no += 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let Some(directive) = line.strip_prefix('#') else {
                pending = Some(parse_entry(line, line_no)?);
                break;
            };

            let fields: Vec<&str> = directive.split_whitespace().collect();
            match fields.as_slice() {
                ["documents", n] => {
                    if document_count.is_some() {
                        return Err(IdfError::malformed(line_no, "duplicate #documents"));
                    }
                    let n = parse_number(n, line_no)?;
                    document_count = Some(NonZeroU64::new(n).ok_or(IdfError::ZeroDocumentCount)?);
                }
                ["length", field, sum] => {
                    lengths.insert((*field).to_string(), parse_number(sum, line_no)?);
                }
                _ => {
                    return Err(IdfError::malformed(
                        line_no,
                        format!("unknown header line {line:?}"),
                    ));
                }
            }
        }

        let document_count = document_count.ok_or(IdfError::MissingDocumentCount)?;
        Ok(Self {
            lines,
            line_no,
            document_count,
            lengths,
            pending,
        })
    }
}

impl<R: BufRead> IdfReader for TextIdfReader<R> {
    fn document_count(&self) -> NonZeroU64 {
        self.document_count
    }

    fn lengths(&self) -> &BTreeMap<String, u64> {
        &self.lengths
    }

    fn next_entry(&mut self) -> Result<Option<(String, u64)>, IdfError> {
        if let Some(entry) = self.pending.take() {
            return Ok(Some(entry));
        }

        for line in self.lines.by_ref() {
            let line = line?;
            self.line_no += 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            if line.starts_with('#') {
                return Err(IdfError::malformed(
                    self.line_no,
                    "header line after term entries",
                ));
            }
            return parse_entry(line, self.line_no).map(Some);
        }
        Ok(None)
    }
}

fn parse_entry(line: &str, line_no: usize) -> Result<(String, u64), IdfError> {
    let (term, df) = line
        .split_once('\t')
        .ok_or_else(|| IdfError::malformed(line_no, "expected term<TAB>df"))?;
    if term.is_empty() {
        return Err(IdfError::malformed(line_no, "empty term"));
    }
    Ok((term.to_string(), parse_number(df.trim(), line_no)?))
}

fn parse_number(s: &str, line_no: usize) -> Result<u64, IdfError> {
    s.parse()
        .map_err(|_| IdfError::malformed(line_no, format!("not a count: {s:?}")))
}
