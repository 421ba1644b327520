//! Parsed representation of a single G-code line.
//!
//! Pure data: a command code, the lettered parameters and the tags found in
//! the trailing comment. No interpretation happens here.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Letter of a command code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CodeLetter {
    G,
    M,
}

/// A command code like "G1" or "M104"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CommandCode {
    pub letter: CodeLetter,
    pub number: u64,
}

impl CommandCode {
    pub const fn g(number: u64) -> Self {
        Self {
            letter: CodeLetter::G,
            number,
        }
    }

    pub const fn m(number: u64) -> Self {
        Self {
            letter: CodeLetter::M,
            number,
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.letter {
            CodeLetter::G => 'G',
            CodeLetter::M => 'M',
        };
        write!(f, "{}{}", letter, self.number)
    }
}

/// Value of a lettered parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ParamValue {
    /// Letter followed by a number, e.g. "X10.5"
    Number(f64),
    /// Letter present without a trailing number
    Flag,
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(value) => Some(*value),
            ParamValue::Flag => None,
        }
    }
}

/// Value of a `key:value` comment tag
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TagValue {
    /// Parse a trimmed tag value; integral numbers become integers.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(value) if is_integral(value) => TagValue::Integer(value as i64),
            Ok(value) => TagValue::Float(value),
            Err(_) => TagValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Integer(value) => Some(*value as f64),
            TagValue::Float(value) => Some(*value),
            TagValue::Text(_) => None,
        }
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64
}

/// One tokenized line of G-code
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Command {
    /// First G/M code on the line, if any
    pub code: Option<CommandCode>,
    /// Parameters keyed by lowercase letter
    pub params: BTreeMap<char, ParamValue>,
    /// Trimmed text after the first `;`
    pub comment: Option<String>,
    /// `key:value` pairs parsed from the comment
    pub tags: BTreeMap<String, TagValue>,
}

impl Command {
    /// Numeric value of a parameter; flags and absent letters yield `None`.
    pub fn number(&self, letter: char) -> Option<f64> {
        self.params
            .get(&letter.to_ascii_lowercase())
            .and_then(ParamValue::as_number)
    }

    /// Whether the letter appeared at all, as a number or a flag.
    pub fn has(&self, letter: char) -> bool {
        self.params.contains_key(&letter.to_ascii_lowercase())
    }

    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.get(key)
    }
}

/// Parse `key:value` tags out of a comment.
///
/// The comment is split on `,`; every piece holding a `:` contributes one
/// pair. Pairs are folded left to right so a repeated key keeps its last value.
pub fn parse_comment_tags(comment: &str) -> BTreeMap<String, TagValue> {
    comment
        .split(',')
        .filter_map(|piece| piece.split_once(':'))
        .map(|(key, value)| (key.trim().to_lowercase(), TagValue::parse(value.trim())))
        .fold(BTreeMap::new(), |mut tags, (key, value)| {
            tags.insert(key, value);
            tags
        })
}
