// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Decoder of HMC CLI tabular output.
//!
//! HMC listing commands print one resource per line. Two line shapes are
//! supported:
//!
//! - Free-form: `KEY=VALUE` tokens joined with commas. A token that
//!   contains commas is quoted, either as a whole (`"key=a,b"`) or just its
//!   value (`key="a,b"`); doubled quotes inside a quoted token stand for a
//!   literal quote. Some fields carry colon-delimited sub-records
//!   (`ciphers=cipher=A: enabled=1,cipher=B: enabled=0`), decoded into a
//!   list of [`Record`]s under the outer key. Keys are upper-cased.
//! - Positional: the output of a command run with `-F a,b,c`. Values are
//!   paired with the requested attribute names by position and keys are
//!   kept exactly as requested.
//!
//! The decoder looks at one unconsumed fragment ahead to decide whether a
//! fragment continues a value that is still open or starts a new field.
//! End of line closes whatever is open.

use crate::record::FieldValue;
use crate::record::Record;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

const INNER_SEPARATOR: &str = ": ";

/// Errors of CLI output decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Positional output does not have as many values as requested
    /// attributes.
    FieldCount {
        expected: usize,
        actual: usize,
        line: String,
    },
    /// Token is neither `key=value` nor a continuation of an open value.
    UnexpectedToken { token: String, line: String },
    /// Positional attribute list names the same attribute twice.
    DuplicateAttribute { name: String },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::FieldCount {
                expected,
                actual,
                line,
            } => write!(
                f,
                "expected {expected} comma-separated values but found {actual}: {line}"
            ),
            Self::UnexpectedToken { token, line } => {
                write!(f, "unexpected token {token:?} (not key=value) in line: {line}")
            }
            Self::DuplicateAttribute { name } => {
                write!(f, "attribute {name:?} is requested more than once")
            }
        }
    }
}

impl StdError for DecodeError {}

/// How to decode lines of a CLI response.
#[derive(Debug, Clone, Copy)]
pub enum DecodeMode<'a> {
    /// `KEY=VALUE` tokens.
    FreeForm,
    /// Values of the listed attributes (`-F` output).
    Positional(&'a [&'a str]),
}

/// Decode a whole CLI response. Empty lines are skipped, every other line
/// is decoded independently.
///
/// # Errors
///
/// Returns the first line decode error.
pub fn decode_output(output: &str, mode: DecodeMode<'_>) -> Result<Vec<Record>, DecodeError> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match mode {
            DecodeMode::FreeForm => decode_line(line),
            DecodeMode::Positional(attributes) => decode_positional(attributes, line),
        })
        .collect()
}

/// Decode one line of `-F` output against the requested attribute names.
///
/// # Errors
///
/// Returns [`DecodeError::DuplicateAttribute`] if an attribute name is
/// repeated and [`DecodeError::FieldCount`] if the number of values differs
/// from the number of attributes.
pub fn decode_positional(attributes: &[&str], line: &str) -> Result<Record, DecodeError> {
    let repeated = attributes
        .iter()
        .enumerate()
        .find_map(|(i, name)| attributes[..i].contains(name).then_some(*name));
    if let Some(name) = repeated {
        return Err(DecodeError::DuplicateAttribute {
            name: name.to_string(),
        });
    }
    let line = strip_terminators(line);
    let values = split_quoted(line);
    if values.len() != attributes.len() {
        return Err(DecodeError::FieldCount {
            expected: attributes.len(),
            actual: values.len(),
            line: line.to_string(),
        });
    }
    let mut record = Record::new();
    for (name, value) in attributes.iter().zip(values) {
        record.insert((*name).to_string(), FieldValue::Scalar(value));
    }
    Ok(record)
}

/// Decode one line of `KEY=VALUE` tokens.
///
/// # Errors
///
/// Returns [`DecodeError::UnexpectedToken`] for a fragment that does not
/// contain `=` and does not continue an open quoted value or sub-record.
pub fn decode_line(line: &str) -> Result<Record, DecodeError> {
    let line = strip_terminators(line);
    let mut record = Record::new();
    if line.trim().is_empty() {
        return Ok(record);
    }
    let fragments: Vec<&str> = line.split(',').collect();
    let mut next = 0;
    while next < fragments.len() {
        let mut token = fragments[next].to_string();
        next += 1;
        // Odd number of quotes: the token's value runs into the next fragments.
        while has_open_quote(&token) && next < fragments.len() {
            token.push(',');
            token.push_str(fragments[next]);
            next += 1;
        }

        let quoted = token.starts_with('"');
        let body = if quoted {
            unquote(&token)
        } else {
            token.clone()
        };
        let Some((key, raw)) = body.split_once('=') else {
            return Err(DecodeError::UnexpectedToken {
                token,
                line: line.to_string(),
            });
        };
        let key = normalize_key(key);

        if !quoted && !raw.starts_with('"') && is_sub_record(raw) {
            let mut inner = Vec::new();
            let mut buffer = raw.to_string();
            loop {
                match lookahead(fragments.get(next).copied()) {
                    Lookahead::End | Lookahead::TopLevel => {
                        inner.push(decode_inner(&buffer, line)?);
                        break;
                    }
                    Lookahead::InnerRecord => {
                        inner.push(decode_inner(&buffer, line)?);
                        buffer = fragments[next].to_string();
                        next += 1;
                    }
                    Lookahead::Continuation => {
                        buffer.push(',');
                        buffer.push_str(fragments[next]);
                        next += 1;
                    }
                }
            }
            record.insert(key, FieldValue::Nested(inner));
        } else {
            let value = if quoted { raw.to_string() } else { unquote(raw) };
            record.insert(key, FieldValue::Scalar(value));
        }
    }
    Ok(record)
}

/// What the next unconsumed fragment means while a sub-record field is
/// being accumulated.
#[derive(Debug, PartialEq, Eq)]
enum Lookahead {
    /// No fragments left.
    End,
    /// Fragment is a complete `k=v: k=v` inner record.
    InnerRecord,
    /// Fragment continues the last inner value, which contained a comma.
    Continuation,
    /// Fragment is the next top-level `KEY=VALUE` token.
    TopLevel,
}

fn lookahead(fragment: Option<&str>) -> Lookahead {
    match fragment {
        None => Lookahead::End,
        Some(f) if f.starts_with('"') || opens_top_level_field(f) => Lookahead::TopLevel,
        Some(f) if f.contains(INNER_SEPARATOR) => {
            if is_sub_record(f) {
                Lookahead::InnerRecord
            } else {
                Lookahead::Continuation
            }
        }
        Some(f) if f.contains('=') => Lookahead::TopLevel,
        Some(_) => Lookahead::Continuation,
    }
}

/// `KEY="..."` or `KEY=k=v: ...`: the head segment belongs to a new outer
/// key rather than to the open sub-record.
fn opens_top_level_field(fragment: &str) -> bool {
    let head = fragment
        .split(INNER_SEPARATOR)
        .next()
        .unwrap_or(fragment);
    match head.split_once('=') {
        Some((_, value)) => value.starts_with('"') || value.contains('='),
        None => false,
    }
}

/// `k=v: k=v` with at least two segments, every one of them `k=v`.
fn is_sub_record(value: &str) -> bool {
    value.contains(INNER_SEPARATOR)
        && value
            .split(INNER_SEPARATOR)
            .all(|segment| segment.contains('='))
}

fn decode_inner(buffer: &str, line: &str) -> Result<Record, DecodeError> {
    let mut record = Record::new();
    for segment in buffer.split(INNER_SEPARATOR) {
        let (key, value) =
            segment
                .split_once('=')
                .ok_or_else(|| DecodeError::UnexpectedToken {
                    token: segment.to_string(),
                    line: line.to_string(),
                })?;
        record.insert(
            normalize_key(key),
            FieldValue::Scalar(strip_terminators(value).to_string()),
        );
    }
    Ok(record)
}

/// Split on commas outside double quotes, then unquote every value.
fn split_quoted(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                values.push(unquote(&current));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    values.push(unquote(&current));
    values
}

fn has_open_quote(token: &str) -> bool {
    token.matches('"').count() % 2 == 1
}

/// Remove wrapping quotes and unescape doubled quotes. A value whose
/// closing quote never came (end of line) loses only the opening quote.
fn unquote(value: &str) -> String {
    let Some(rest) = value.strip_prefix('"') else {
        return value.to_string();
    };
    rest.strip_suffix('"').unwrap_or(rest).replace("\"\"", "\"")
}

fn normalize_key(key: &str) -> String {
    key.trim_matches(|c: char| c == '"' || c == '\r' || c == '\n')
        .to_uppercase()
}

fn strip_terminators(s: &str) -> &str {
    s.trim_end_matches(|c: char| c == '\r' || c == '\n')
}
