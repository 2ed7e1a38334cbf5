//! CSV-backed row source for merge templates
//!
//! The whole file is read once, at construction. Only columns whose header
//! starts with `@` are handed out by [`RowSource::next_row`]; the full rows
//! stay available for inspection. A file without any `@` column has nothing
//! to merge and reports no rows.

use crate::types::{MERGE_FIELD_PREFIX, PaginateError, Result, Row};
use std::path::{Path, PathBuf};

/// Bytes inspected when guessing the delimiter
const SNIFF_SAMPLE_BYTES: usize = 4096;

/// Delimiters tried by the sniffer, in order of preference
const CANDIDATE_DELIMITERS: [u8; 5] = [b',', b'\t', b';', b'|', b':'];

const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Clone)]
pub struct RowSource {
    origin: PathBuf,
    delimiter: u8,
    headers: Vec<String>,
    merge_fields: Vec<String>,
    rows: Vec<Row>,
    cursor: usize,
}

impl RowSource {
    /// Read and parse a delimited file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| PaginateError::InvalidData {
            path: path.to_owned(),
            reason: format!("unreadable: {}", e),
        })?;
        Self::from_bytes(&bytes, path)
    }

    /// Async variant of [`RowSource::from_path`]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_owned();

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| PaginateError::InvalidData {
                path: path.clone(),
                reason: format!("unreadable: {}", e),
            })?;

        tokio::task::spawn_blocking(move || Self::from_bytes(&bytes, &path)).await?
    }

    fn from_bytes(bytes: &[u8], origin: &Path) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| PaginateError::InvalidData {
            path: origin.to_owned(),
            reason: format!("not valid UTF-8: {}", e),
        })?;
        Self::parse(text, origin)
    }

    /// Parse already-loaded text. `origin` is only used for error messages.
    pub fn parse(text: &str, origin: impl AsRef<Path>) -> Result<Self> {
        let origin = origin.as_ref().to_owned();
        let invalid = |reason: String| PaginateError::InvalidData {
            path: origin.clone(),
            reason,
        };

        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
        if text.trim().is_empty() {
            return Err(invalid("file is empty".to_string()));
        }

        let delimiter = sniff_delimiter(text).unwrap_or(b',');

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| invalid(format!("malformed header row: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() {
            return Err(invalid("missing header row".to_string()));
        }
        if let Some(pos) = headers.iter().position(|h| h.is_empty()) {
            return Err(invalid(format!("header in column {} is empty", pos + 1)));
        }

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record =
                result.map_err(|e| invalid(format!("malformed record {}: {}", line + 1, e)))?;
            let row: Row = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
                .collect();
            rows.push(row);
        }

        let merge_fields: Vec<String> = headers
            .iter()
            .filter(|h| h.starts_with(MERGE_FIELD_PREFIX))
            .cloned()
            .collect();
        if merge_fields.is_empty() {
            log::warn!(
                "{} has no '{}' columns; treating it as empty",
                origin.display(),
                MERGE_FIELD_PREFIX
            );
        }

        log::debug!(
            "Loaded {} rows from {} (delimiter {:?})",
            rows.len(),
            origin.display(),
            delimiter as char
        );

        Ok(Self {
            origin,
            delimiter,
            headers,
            merge_fields,
            rows,
            cursor: 0,
        })
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// All column headers, in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Headers that start with `@`
    pub fn merge_fields(&self) -> &[String] {
        &self.merge_fields
    }

    /// Rows available for merging. Zero when the file has no merge fields.
    pub fn row_count(&self) -> usize {
        if self.merge_fields.is_empty() {
            0
        } else {
            self.rows.len()
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.row_count().saturating_sub(self.cursor)
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.row_count()
    }

    /// Merge fields of the row under the cursor, then advance
    pub fn next_row(&mut self) -> Result<Row> {
        if !self.has_next() {
            return Err(PaginateError::Exhausted);
        }
        let row = self.rows.get(self.cursor).ok_or(PaginateError::Exhausted)?;
        let fields = self.merge_view(row);
        self.cursor += 1;
        Ok(fields)
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Merge fields of every row. Does not move the cursor.
    pub fn iter_rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.rows[..self.row_count()]
            .iter()
            .map(|row| self.merge_view(row))
    }

    /// Every column of every row. Does not move the cursor.
    pub fn iter_full_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter()
    }

    fn merge_view(&self, row: &Row) -> Row {
        self.merge_fields
            .iter()
            .map(|field| {
                let value = row.get(field).cloned().unwrap_or_default();
                (field.clone(), value)
            })
            .collect()
    }
}

/// Guess the field delimiter from the start of the file.
///
/// A candidate qualifies when it occurs, outside quotes, the same non-zero
/// number of times on every sampled line. Returns `None` when nothing
/// qualifies.
pub fn sniff_delimiter(text: &str) -> Option<u8> {
    let sample = sample_prefix(text, SNIFF_SAMPLE_BYTES);
    let truncated = sample.len() < text.len();

    let mut lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    // The last line of a cut sample is probably partial
    if truncated && lines.len() > 1 {
        lines.pop();
    }
    if lines.is_empty() {
        return None;
    }

    CANDIDATE_DELIMITERS.into_iter().find(|&delim| {
        let first = count_unquoted(lines[0], delim);
        first > 0 && lines.iter().all(|line| count_unquoted(line, delim) == first)
    })
}

fn sample_prefix(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn count_unquoted(line: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delim && !in_quotes {
            count += 1;
        }
    }
    count
}
