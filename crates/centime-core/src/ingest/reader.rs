//! Tolerant tabular reader for statement exports
//!
//! Decodes raw upload bytes as UTF-8 (lossy, never fails on encoding) and
//! parses them into a rectangular table of string cells. Quoted fields may
//! contain the delimiter and embedded newlines; quoting may be inconsistent
//! across rows. The first parsed row is always the header row.

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};

use super::sniff::sniff_delimiter;

/// Policy for rows whose cell count disagrees with the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowShape {
    /// Shape mismatch is a parse error naming the offending line
    #[default]
    Strict,
    /// Short rows are padded with empty cells, long rows truncated
    Lenient,
}

/// A decoded, delimiter-parsed statement table prior to any semantic
/// interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column names in file order, trimmed
    pub headers: Vec<String>,
    /// Data rows, each aligned positionally to `headers`
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Look up a column's position by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Parse raw statement bytes into a `RawTable`
///
/// The delimiter is sniffed from the leading bytes. Fails with `EmptyInput`
/// when the file yields no rows at all (not even a header row), and with
/// `MalformedRow` in strict mode when a data row's width disagrees with the
/// header's. Header names must be unique after trimming.
pub fn read_table(data: &[u8], shape: RowShape) -> Result<RawTable> {
    let delimiter = sniff_delimiter(data);
    let text = String::from_utf8_lossy(data);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();

    let header_record = match records.next() {
        Some(record) => record?,
        None => return Err(Error::EmptyInput),
    };
    let headers: Vec<String> = header_record.iter().map(|h| h.trim().to_string()).collect();

    for (i, header) in headers.iter().enumerate() {
        if headers[..i].contains(header) {
            return Err(Error::InvalidData(format!(
                "duplicate column name: {}",
                header
            )));
        }
    }

    let width = headers.len();
    let mut rows = Vec::new();

    for (i, result) in records.enumerate() {
        let record = result?;
        let mut cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();

        if cells.len() != width {
            match shape {
                RowShape::Strict => {
                    // Line numbers are 1-based and include the header row
                    return Err(Error::MalformedRow {
                        line: i + 2,
                        expected: width,
                        found: cells.len(),
                    });
                }
                RowShape::Lenient => {
                    debug!(
                        line = i + 2,
                        expected = width,
                        found = cells.len(),
                        "reshaping uneven row"
                    );
                    cells.resize(width, String::new());
                }
            }
        }

        rows.push(cells);
    }

    debug!(
        columns = width,
        rows = rows.len(),
        delimiter = %char::from(delimiter),
        "parsed statement table"
    );

    Ok(RawTable { headers, rows })
}
