//! Character-at-a-time CSV reader.
//!
//! Companion to the archive writer rather than part of it: the CLI uses it
//! to preview the head of produced `.csv` entries while their chunks stream
//! past, and tests use it to validate fixture content. It forms complete
//! rows as data arrives and can stop collecting once a cutoff is reached, so
//! a preview never holds more than a few rows regardless of input size.
//!
//! Quoting follows the usual CSV rules: fields may be wrapped in double
//! quotes, quoted fields may contain commas and newlines, and a quote inside
//! a quoted field is written twice. A character other than `,`, `\n` or `"`
//! directly after a closing quote is malformed and surfaced immediately.

use thiserror::Error;

/// Malformed CSV input.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unexpected character following quote: {0:?}")]
pub struct CsvError(pub char);

/// Streaming CSV parser with an optional row cutoff.
#[derive(Debug)]
pub struct CsvReader {
    /// Complete rows parsed so far.
    pub rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_field: String,
    escaped: bool,
    start_of_field: bool,
    check_escape: bool,
    cutoff_rows: Option<usize>,
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReader {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            current_row: Vec::new(),
            current_field: String::new(),
            escaped: false,
            start_of_field: true,
            check_escape: false,
            cutoff_rows: None,
        }
    }

    /// A reader that stops collecting once `cutoff` rows are complete.
    pub fn with_cutoff(cutoff: usize) -> Self {
        Self {
            cutoff_rows: Some(cutoff),
            ..Self::new()
        }
    }

    /// Feed a chunk of raw bytes. Processing is byte-per-character; rows
    /// complete as their terminating newline arrives.
    pub fn process(&mut self, data: &[u8]) -> Result<(), CsvError> {
        for &byte in data {
            if let Some(cutoff) = self.cutoff_rows
                && self.rows.len() >= cutoff
            {
                return Ok(());
            }
            self.read_char(byte as char)?;
        }
        Ok(())
    }

    fn read_char(&mut self, c: char) -> Result<(), CsvError> {
        if self.start_of_field {
            if c == ',' {
                // Empty field
                self.push_field();
                return Ok(());
            }
            if c == '\n' {
                self.push_line();
                return Ok(());
            }
            self.escaped = c == '"';
            self.start_of_field = false;
            if self.escaped {
                return Ok(());
            }
        }

        if self.check_escape {
            self.check_escape = false;
            if c == '"' {
                // A doubled quote
                self.current_field.push('"');
                return Ok(());
            }
            // The previous quote closed the field
            return match c {
                ',' => {
                    self.push_field();
                    Ok(())
                }
                '\n' => {
                    self.push_line();
                    Ok(())
                }
                _ => Err(CsvError(c)),
            };
        }

        if !self.escaped && (c == ',' || c == '\n') {
            if c == ',' {
                self.push_field();
            } else {
                self.push_line();
            }
            return Ok(());
        }

        if self.escaped && c == '"' {
            // Either the closing quote or the first half of a doubled one
            self.check_escape = true;
            return Ok(());
        }

        self.current_field.push(c);
        Ok(())
    }

    fn push_field(&mut self) {
        let field = std::mem::take(&mut self.current_field);
        self.current_row.push(field);
        self.reset_field();
    }

    fn push_line(&mut self) {
        if self.current_row.is_empty() && self.current_field.is_empty() && self.start_of_field {
            // Blank line
            self.reset_line();
        } else {
            self.push_field();
            let row = std::mem::take(&mut self.current_row);
            self.rows.push(row);
            self.reset_line();
        }
    }

    fn reset_field(&mut self) {
        self.current_field.clear();
        self.escaped = false;
        self.start_of_field = true;
    }

    fn reset_line(&mut self) {
        self.reset_field();
        self.current_row.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<Vec<String>> {
        let mut reader = CsvReader::new();
        reader.process(input.as_bytes()).unwrap();
        reader.rows
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_plain_rows() {
        assert_eq!(
            parse("header1,header2,header3\nrow1,row2,row3\n"),
            vec![
                row(&["header1", "header2", "header3"]),
                row(&["row1", "row2", "row3"]),
            ]
        );
    }

    #[test]
    fn test_quoted_fields() {
        assert_eq!(
            parse("\"dog\",\"cat\",\"park\"\n"),
            vec![row(&["dog", "cat", "park"])]
        );
    }

    #[test]
    fn test_doubled_quotes() {
        assert_eq!(
            parse("\"\"\"hello\"\"\",\"middle\"\"quote\",\"\"\"\",\"\"\n"),
            vec![row(&["\"hello\"", "middle\"quote", "\"", ""])]
        );
    }

    #[test]
    fn test_empty_and_embedded_separators() {
        assert_eq!(
            parse(",,\"a,b\",\",\",,\n"),
            vec![row(&["", "", "a,b", ",", "", ""])]
        );
    }

    #[test]
    fn test_quoted_field_spanning_lines() {
        assert_eq!(
            parse("F99,MST,\"February 16, 2021\nMr. Michael Dobi\n\"\n"),
            vec![row(&["F99", "MST", "February 16, 2021\nMr. Michael Dobi\n"])]
        );
    }

    #[test]
    fn test_character_after_closing_quote_errors() {
        let mut reader = CsvReader::new();
        let err = reader
            .process(b"\"abc\"def\",<-this should error\n")
            .unwrap_err();
        assert_eq!(err, CsvError('d'));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(parse("\na,b\n\nc,d\n"), vec![row(&["a", "b"]), row(&["c", "d"])]);
    }

    #[test]
    fn test_chunk_boundaries_do_not_matter() {
        let mut reader = CsvReader::new();
        reader.process(b"a,\"b").unwrap();
        reader.process(b"\"\"c\",d\ne").unwrap();
        reader.process(b",f\n").unwrap();
        assert_eq!(
            reader.rows,
            vec![row(&["a", "b\"c", "d"]), row(&["e", "f"])]
        );
    }

    #[test]
    fn test_cutoff_stops_collecting() {
        let mut reader = CsvReader::with_cutoff(2);
        reader.process(b"a\nb\nc\nd\n").unwrap();
        assert_eq!(reader.rows, vec![row(&["a"]), row(&["b"])]);
    }
}
