// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flat key/value text records.
//!
//! One `key=value` pair per line. Backslash, `=`, `#`, newline,
//! carriage return and tab are escaped in both keys and values; the first
//! unescaped `=` separates the key. Blank lines and lines starting with
//! `#` are ignored. Later duplicates of a key replace earlier ones.

use indexmap::IndexMap;
use thiserror::Error;

pub type Record = IndexMap<String, String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("line {line}: missing '=' separator")]
    MissingSeparator { line: usize },
    #[error("line {line}: invalid escape sequence")]
    BadEscape { line: usize },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

pub fn encode(record: &Record) -> String {
    let mut out = String::new();
    for (key, value) in record {
        escape_into(&mut out, key);
        out.push('=');
        escape_into(&mut out, value);
        out.push('\n');
    }
    out
}

pub fn decode(text: &str) -> Result<Record, RecordError> {
    let mut record = Record::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() || raw.starts_with('#') {
            continue;
        }
        let (key, value) = split_line(raw, line)?;
        record.insert(key, value);
    }
    Ok(record)
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '=' => out.push_str("\\="),
            '#' => out.push_str("\\#"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
}

fn split_line(raw: &str, line: usize) -> Result<(String, String), RecordError> {
    let mut key = String::new();
    let mut value = String::new();
    let mut in_key = true;
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        let target = if in_key { &mut key } else { &mut value };
        match c {
            '\\' => {
                let escaped = match chars.next() {
                    Some('\\') => '\\',
                    Some('=') => '=',
                    Some('#') => '#',
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    _ => return Err(RecordError::BadEscape { line }),
                };
                target.push(escaped);
            }
            '=' if in_key => in_key = false,
            c => target.push(c),
        }
    }
    if in_key {
        return Err(RecordError::MissingSeparator { line });
    }
    Ok((key, value))
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
