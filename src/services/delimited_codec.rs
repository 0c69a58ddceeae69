//! Delimited text codec for vault records.
//!
//! Records are flattened into a single row of columns before encryption. Strings that contain
//! one of the syntax characters are wrapped in string separators; inside such a quoted field the
//! row divider is written as `\n`, the separator as `\"` and a backslash as `\\`. An absent value
//! is written as the reserved sentinel [`NULL_SENTINEL`].

use std::fmt;

use crate::types::errors::CodecError;

/// Reserved text standing in for an absent field. Callers must never store it as real data.
pub const NULL_SENTINEL: &str = "\u{0}";

const ESCAPE: char = '\\';

/// Syntax characters used by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    pub column_divider: char,
    pub row_divider: char,
    pub string_separator: char,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            column_divider: ',',
            row_divider: '\n',
            string_separator: '"',
        }
    }
}

impl CodecConfig {
    fn is_special(&self, c: char) -> bool {
        c == self.column_divider || c == self.row_divider || c == self.string_separator
    }
}

/// A single typed column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Int(i64),
    Bool(bool),
    Float(f64),
    Char(char),
    Text(String),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Null => f.write_str(NULL_SENTINEL),
            Field::Int(v) => write!(f, "{}", v),
            Field::Bool(v) => write!(f, "{}", v),
            Field::Float(v) => write!(f, "{}", v),
            Field::Char(v) => write!(f, "{}", v),
            Field::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::Int(v)
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Int(v as i64)
    }
}

impl From<i8> for Field {
    fn from(v: i8) -> Self {
        Field::Int(v as i64)
    }
}

impl From<bool> for Field {
    fn from(v: bool) -> Self {
        Field::Bool(v)
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::Float(v)
    }
}

impl From<char> for Field {
    fn from(v: char) -> Self {
        Field::Char(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::Text(v.to_string())
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::Text(v)
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Field::Null)
    }
}

/// Builds delimited rows one column at a time.
pub struct RowBuilder {
    config: CodecConfig,
    buffer: String,
    line_empty: bool,
}

impl RowBuilder {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            config,
            buffer: String::new(),
            line_empty: true,
        }
    }

    /// Appends a column to the current row.
    ///
    /// Numbers and booleans are written verbatim. Characters are treated as one-character
    /// strings so that a divider character survives the round trip.
    pub fn append(&mut self, field: impl Into<Field>) -> &mut Self {
        match field.into() {
            Field::Null => self.append_raw(NULL_SENTINEL),
            Field::Text(text) => self.append_str(&text),
            Field::Char(c) => {
                let mut tmp = [0u8; 4];
                self.append_str(c.encode_utf8(&mut tmp))
            }
            other => self.append_raw(&other.to_string()),
        }
    }

    /// Appends a string column, quoting and escaping it if it contains syntax characters.
    pub fn append_str(&mut self, value: &str) -> &mut Self {
        let quoted = value.chars().any(|c| self.config.is_special(c));
        if !quoted {
            return self.append_raw(value);
        }

        let mut escaped = String::with_capacity(value.len() + 2);
        escaped.push(self.config.string_separator);
        for c in value.chars() {
            if c == self.config.row_divider {
                escaped.push(ESCAPE);
                escaped.push('n');
            } else if c == self.config.string_separator || c == ESCAPE {
                escaped.push(ESCAPE);
                escaped.push(c);
            } else {
                escaped.push(c);
            }
        }
        escaped.push(self.config.string_separator);
        self.append_raw(&escaped)
    }

    fn append_raw(&mut self, text: &str) -> &mut Self {
        if !self.line_empty {
            self.buffer.push(self.config.column_divider);
        }
        self.buffer.push_str(text);
        self.line_empty = false;
        self
    }

    /// Terminates the current row.
    pub fn new_line(&mut self) -> &mut Self {
        self.buffer.push(self.config.row_divider);
        self.line_empty = true;
        self
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

impl Default for RowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over the columns of delimited text produced by [`RowBuilder`].
///
/// Malformed input never panics: an unterminated quoted field swallows the rest of the input
/// and the problem is recorded in [`RowParser::errors`].
pub struct RowParser {
    config: CodecConfig,
    chars: Vec<char>,
    index: usize,
    errors: Vec<CodecError>,
}

impl RowParser {
    pub fn new(text: &str) -> Self {
        Self::with_config(text, CodecConfig::default())
    }

    pub fn with_config(text: &str, config: CodecConfig) -> Self {
        Self {
            config,
            chars: text.chars().collect(),
            index: 0,
            errors: Vec::new(),
        }
    }

    pub fn has_next(&self) -> bool {
        self.index < self.chars.len()
    }

    /// Returns true if the cursor is at the start of a new row.
    pub fn at_row_start(&self) -> bool {
        self.index == 0 || self.chars.get(self.index - 1) == Some(&self.config.row_divider)
    }

    /// Parses the next column. Returns `None` for a null column and at end of input.
    pub fn next_field(&mut self) -> Option<String> {
        if !self.has_next() {
            return None;
        }
        let text = if self.chars[self.index] == self.config.string_separator {
            self.read_quoted()
        } else {
            self.read_plain()
        };
        if text == NULL_SENTINEL {
            None
        } else {
            Some(text)
        }
    }

    /// Parses columns until the end of the current row.
    pub fn next_row(&mut self) -> Vec<Option<String>> {
        let mut row = Vec::new();
        while self.has_next() {
            row.push(self.next_field());
            if self.at_row_start() {
                break;
            }
        }
        row
    }

    /// Problems recovered from so far.
    pub fn errors(&self) -> &[CodecError] {
        &self.errors
    }

    fn read_plain(&mut self) -> String {
        let mut column = String::new();
        while let Some(&c) = self.chars.get(self.index) {
            self.index += 1;
            if c == self.config.column_divider || c == self.config.row_divider {
                return column;
            }
            column.push(c);
        }
        column
    }

    fn read_quoted(&mut self) -> String {
        let start = self.index;
        self.index += 1;
        let mut column = String::new();
        while let Some(&c) = self.chars.get(self.index) {
            if c == ESCAPE {
                match self.chars.get(self.index + 1) {
                    Some('n') => {
                        column.push(self.config.row_divider);
                        self.index += 2;
                    }
                    Some(&next) if next == self.config.string_separator || next == ESCAPE => {
                        column.push(next);
                        self.index += 2;
                    }
                    _ => {
                        column.push(c);
                        self.index += 1;
                    }
                }
                continue;
            }
            if c == self.config.string_separator {
                self.index += 1;
                if let Some(&next) = self.chars.get(self.index) {
                    if next == self.config.column_divider || next == self.config.row_divider {
                        self.index += 1;
                    }
                }
                return column;
            }
            column.push(c);
            self.index += 1;
        }
        self.errors.push(CodecError::UnterminatedField(start));
        column
    }
}

impl Iterator for RowParser {
    type Item = Option<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.next_field())
        } else {
            None
        }
    }
}

/// Encodes the fields as a single row terminated by the row divider.
///
/// An empty field list encodes to an empty string.
pub fn encode_row<I, F>(fields: I) -> String
where
    I: IntoIterator<Item = F>,
    F: Into<Field>,
{
    let mut builder = RowBuilder::new();
    let mut any = false;
    for field in fields {
        builder.append(field);
        any = true;
    }
    if any {
        builder.new_line();
    }
    builder.finish()
}

/// Decodes every column of the text.
pub fn decode_row(text: &str) -> Vec<Option<String>> {
    RowParser::new(text).collect()
}
