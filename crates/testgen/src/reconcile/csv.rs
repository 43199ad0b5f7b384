//! Tolerant quoted-CSV tokenizer.
//!
//! Unlike a strict reader this never aborts on a bad data row: each
//! record is flagged as malformed instead, and the caller decides what
//! to drop. Only a missing or malformed header is fatal.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

/// Fatal parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvParseError {
    #[error("no header record found")]
    MissingHeader,

    #[error("header record is malformed")]
    MalformedHeader,
}

/// One logical CSV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub fields: Vec<String>,
    /// A quote was unbalanced or misplaced somewhere in the record.
    pub malformed: bool,
    quoted: bool,
}

impl Record {
    fn is_blank(&self) -> bool {
        !self.quoted && !self.malformed && self.fields.len() == 1 && self.fields[0].trim().is_empty()
    }
}

/// Header plus the data rows that matched its width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCsv {
    /// Header names, trimmed.
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Data records dropped for being malformed or the wrong width.
    pub dropped: usize,
}

enum FieldEnd {
    Delimiter,
    Record,
    Eof,
}

/// Split `text` into records, skipping blank lines.
pub fn read_records(text: &str) -> Vec<Record> {
    let mut chars = text.chars().peekable();
    let mut records = Vec::new();

    while chars.peek().is_some() {
        let record = read_record(&mut chars);
        if !record.is_blank() {
            records.push(record);
        }
    }

    records
}

/// Parse `text` as a header record followed by data records.
pub fn parse_quoted_csv(text: &str) -> Result<ParsedCsv, CsvParseError> {
    let mut records = read_records(text).into_iter();

    let header = records.next().ok_or(CsvParseError::MissingHeader)?;
    if header.malformed {
        return Err(CsvParseError::MalformedHeader);
    }
    let header: Vec<String> = header.fields.iter().map(|f| f.trim().to_string()).collect();

    let mut rows = Vec::new();
    let mut dropped = 0;
    for record in records {
        if record.malformed || record.fields.len() != header.len() {
            dropped += 1;
            continue;
        }
        rows.push(record.fields);
    }

    Ok(ParsedCsv {
        header,
        rows,
        dropped,
    })
}

fn read_record(chars: &mut Peekable<Chars<'_>>) -> Record {
    let mut record = Record {
        fields: Vec::new(),
        malformed: false,
        quoted: false,
    };

    loop {
        let (value, quoted, malformed, end) = read_field(chars);
        record.fields.push(value);
        record.quoted |= quoted;
        record.malformed |= malformed;
        match end {
            FieldEnd::Delimiter => {}
            FieldEnd::Record | FieldEnd::Eof => return record,
        }
    }
}

/// Returns (value, quoted, malformed, end).
fn read_field(chars: &mut Peekable<Chars<'_>>) -> (String, bool, bool, FieldEnd) {
    // Whitespace before an opening quote belongs to the delimiter.
    let mut lookahead = chars.clone();
    let mut padding = 0;
    while matches!(lookahead.peek(), Some(' ' | '\t')) {
        lookahead.next();
        padding += 1;
    }
    if lookahead.peek() == Some(&'"') {
        for _ in 0..padding {
            chars.next();
        }
        let (value, malformed, end) = read_quoted(chars);
        return (value, true, malformed, end);
    }

    let (value, malformed, end) = read_unquoted(chars);
    (value, false, malformed, end)
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> (String, bool, FieldEnd) {
    chars.next();
    let mut value = String::new();

    loop {
        match chars.next() {
            None => return (value, true, FieldEnd::Eof),
            Some('"') => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    value.push('"');
                } else {
                    break;
                }
            }
            Some(c) => value.push(c),
        }
    }

    while matches!(chars.peek(), Some(' ' | '\t')) {
        chars.next();
    }

    match chars.next() {
        None => (value, false, FieldEnd::Eof),
        Some(',') => (value, false, FieldEnd::Delimiter),
        Some('\n') => (value, false, FieldEnd::Record),
        Some('\r') => {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            (value, false, FieldEnd::Record)
        }
        Some(_) => {
            // Stray text after the closing quote: swallow the rest of the field.
            let (_, _, end) = read_unquoted(chars);
            (value, true, end)
        }
    }
}

fn read_unquoted(chars: &mut Peekable<Chars<'_>>) -> (String, bool, FieldEnd) {
    let mut value = String::new();
    let mut malformed = false;

    loop {
        match chars.next() {
            None => return (value, malformed, FieldEnd::Eof),
            Some(',') => return (value, malformed, FieldEnd::Delimiter),
            Some('\n') => return (value, malformed, FieldEnd::Record),
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                return (value, malformed, FieldEnd::Record);
            }
            Some('"') => {
                malformed = true;
                value.push('"');
            }
            Some(c) => value.push(c),
        }
    }
}
