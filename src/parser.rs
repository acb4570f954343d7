use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{Error, ParseError, ParseErrorKind};
use crate::model::Entry;

/// Parse environment-file entries from UTF-8 text.
///
/// Parsing is strict: the first malformed statement fails the whole input.
/// Later assignments of the same key replace earlier ones in place.
pub fn parse_str(input: &str) -> Result<Vec<Entry>, Error> {
    parse_statements(input, Err).map_err(Error::from)
}

/// Parse environment-file entries from UTF-8 bytes. Strict, like [`parse_str`].
pub fn parse_bytes(input: &[u8]) -> Result<Vec<Entry>, Error> {
    let text = std::str::from_utf8(input)?;
    parse_str(text)
}

/// Parse every well-formed statement, collecting one error per skipped one.
pub(crate) fn parse_lenient(input: &str) -> (Vec<Entry>, Vec<ParseError>) {
    let mut skipped = Vec::new();
    let entries = parse_statements(input, |err| {
        skipped.push(err);
        Ok(())
    })
    .unwrap_or_default();
    (entries, skipped)
}

fn parse_statements<F>(input: &str, mut on_error: F) -> Result<Vec<Entry>, ParseError>
where
    F: FnMut(ParseError) -> Result<(), ParseError>,
{
    let normalized = normalize_newlines(input);

    let mut entries: Vec<Entry> = Vec::new();
    let mut by_key = HashMap::<String, usize>::new();

    for (line, statement) in Statements::new(&normalized) {
        let entry = match parse_statement(statement, line) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(err) => {
                on_error(err)?;
                continue;
            }
        };

        match by_key.get(&entry.key) {
            Some(&idx) => entries[idx] = entry,
            None => {
                by_key.insert(entry.key.clone(), entries.len());
                entries.push(entry);
            }
        }
    }

    Ok(entries)
}

/// Splits input into logical statements, letting quoted values span lines.
struct Statements<'a> {
    input: &'a str,
    offset: usize,
    line: u32,
}

impl<'a> Statements<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            line: 1,
        }
    }
}

impl<'a> Iterator for Statements<'a> {
    type Item = (u32, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.input.as_bytes();
        if self.offset >= bytes.len() {
            return None;
        }

        let start = self.offset;
        let line = self.line;
        let mut idx = start;
        let mut quote: Option<u8> = None;
        let mut state = if self.input[start..]
            .trim_start_matches([' ', '\t'])
            .starts_with('#')
        {
            ValueState::Comment
        } else {
            ValueState::Key
        };

        while idx < bytes.len() {
            let byte = bytes[idx];
            if byte == b'\n' {
                if quote.is_none() {
                    break;
                }
                self.line += 1;
            } else if let Some(open) = quote {
                if byte == open && !is_escaped(bytes, idx) {
                    quote = None;
                }
            } else {
                match state {
                    ValueState::Key if byte == b'=' => state = ValueState::Leading,
                    // only a leading quote can span lines
                    ValueState::Leading if matches!(byte, b'"' | b'\'' | b'`') => {
                        quote = Some(byte);
                        state = ValueState::Body;
                    }
                    ValueState::Leading if byte != b' ' && byte != b'\t' => {
                        state = ValueState::Body;
                    }
                    _ => {}
                }
            }
            idx += 1;
        }

        let statement = &self.input[start..idx];
        if idx < bytes.len() {
            // consume the terminating newline
            idx += 1;
            self.line += 1;
        }
        self.offset = idx;
        Some((line, statement))
    }
}

#[derive(Clone, Copy)]
enum ValueState {
    Comment,
    Key,
    Leading,
    Body,
}

fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
}

fn is_escaped(bytes: &[u8], idx: usize) -> bool {
    let backslashes = bytes[..idx]
        .iter()
        .rev()
        .take_while(|byte| **byte == b'\\')
        .count();
    backslashes % 2 == 1
}

fn parse_statement(statement: &str, line: u32) -> Result<Option<Entry>, ParseError> {
    let mut working = statement.trim_start();
    if working.is_empty() || working.starts_with('#') {
        return Ok(None);
    }

    if let Some(rest) = working.strip_prefix("export")
        && rest.starts_with(char::is_whitespace)
    {
        working = rest.trim_start();
    }

    let Some((raw_key, raw_value)) = working.split_once('=') else {
        let column = working.chars().count() as u32 + 1;
        return Err(ParseError::new(line, column, ParseErrorKind::InvalidSyntax));
    };

    let key = raw_key.trim_end();
    if key.is_empty() {
        return Err(ParseError::new(line, 1, ParseErrorKind::MissingKey));
    }
    if !key.chars().all(is_key_char) {
        return Err(ParseError::new(line, 1, ParseErrorKind::InvalidKey));
    }

    let value_input = raw_value.trim_start();
    let column = (statement.len() - value_input.len()) as u32 + 1;
    let value = parse_value(value_input, line, column)?;

    Ok(Some(Entry {
        key: key.to_owned(),
        value,
        line,
    }))
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')
}

fn parse_value(input: &str, line: u32, column: u32) -> Result<String, ParseError> {
    match input.chars().next() {
        None => Ok(String::new()),
        Some('"') => parse_double_quoted(input, line, column),
        Some(quote @ ('\'' | '`')) => parse_literal_quoted(input, quote, line, column),
        Some(_) => {
            let value = input.split_once('#').map_or(input, |(head, _)| head);
            Ok(value.trim_end().to_owned())
        }
    }
}

fn parse_literal_quoted(
    input: &str,
    quote: char,
    line: u32,
    column: u32,
) -> Result<String, ParseError> {
    let closing = input
        .char_indices()
        .skip(1)
        .find(|&(idx, ch)| ch == quote && !is_escaped(input.as_bytes(), idx))
        .map(|(idx, _)| idx);

    let Some(end) = closing else {
        return Err(ParseError::new(line, column, ParseErrorKind::UnterminatedQuote));
    };

    check_tail(input, end, line, column)?;
    Ok(input[1..end].to_owned())
}

/// Double quotes understand `\n`, `\r`, `\t`, `\\` and `\"`; any other
/// escape, `\$` included, is kept verbatim for the interpolator.
fn parse_double_quoted(input: &str, line: u32, column: u32) -> Result<String, ParseError> {
    let mut out = String::with_capacity(input.len().saturating_sub(2));
    let mut escaped = false;
    let mut closing = None;

    for (idx, ch) in input.char_indices().skip(1) {
        if escaped {
            match ch {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '\\' | '"' => out.push(ch),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '"' => {
                closing = Some(idx);
                break;
            }
            _ => out.push(ch),
        }
    }

    let Some(end) = closing else {
        return Err(ParseError::new(line, column, ParseErrorKind::UnterminatedQuote));
    };

    check_tail(input, end, line, column)?;
    Ok(out)
}

/// Only whitespace or a comment may follow a closing quote.
fn check_tail(input: &str, end: usize, line: u32, column: u32) -> Result<(), ParseError> {
    let tail = input[end + 1..].trim_start();
    if tail.is_empty() || tail.starts_with('#') {
        return Ok(());
    }
    Err(ParseError::new(
        line,
        column + end as u32 + 1,
        ParseErrorKind::InvalidSyntax,
    ))
}
