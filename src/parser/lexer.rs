//! GCode Lexer
//!
//! Turns one line of text into a [`Command`]: the first G/M code, every
//! lettered parameter and the tags of the trailing `;` comment.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{GcodeError, Result};
use crate::parser::ast::{parse_comment_tags, CodeLetter, Command, CommandCode, ParamValue};

/// First G/M code, searched on the upper-cased body
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([GM])(\d+)").expect("valid command regex"));

/// G/M codes removed from the lower-cased body before reading parameters
static STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[gm]\d+").expect("valid strip regex"));

/// A letter, optional whitespace and a signed decimal number
static PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-z])\s*([+-]?(?:[0-9]*[.])?[0-9]+)").expect("valid parameter regex")
});

/// Tokenize a line of GCode into a [`Command`].
///
/// Never fails: a line without a G/M code yields `code: None`, and numbers
/// that cannot be read leave their letter as a flag.
pub fn tokenize_line(line: &str) -> Command {
    let (body, comment) = match line.split_once(';') {
        Some((body, comment)) => (body, Some(comment.trim().to_string())),
        None => (line, None),
    };

    let tags = comment
        .as_deref()
        .map(parse_comment_tags)
        .unwrap_or_default();

    Command {
        code: find_code(body),
        params: find_params(body),
        comment,
        tags,
    }
}

/// Tokenize a raw line, rejecting bytes that are not UTF-8 text.
pub fn tokenize_bytes(line: &[u8]) -> Result<Command> {
    let text = std::str::from_utf8(line)
        .map_err(|e| GcodeError::MalformedInput(format!("line is not valid UTF-8 text: {}", e)))?;
    Ok(tokenize_line(text))
}

fn find_code(body: &str) -> Option<CommandCode> {
    let upper = body.to_uppercase();
    let captures = CODE_RE.captures(&upper)?;

    let letter = match &captures[1] {
        "G" => CodeLetter::G,
        _ => CodeLetter::M,
    };
    // Only overflow can fail; such codes saturate and stay unsupported
    let number = captures[2].parse::<u64>().unwrap_or(u64::MAX);

    Some(CommandCode { letter, number })
}

fn find_params(body: &str) -> BTreeMap<char, ParamValue> {
    let lower = body.to_lowercase();
    let args = STRIP_RE.replace_all(&lower, "");

    let mut params = BTreeMap::new();

    // Leftmost match per letter wins
    for captures in PARAM_RE.captures_iter(&args) {
        let Some(letter) = captures[1].chars().next() else {
            continue;
        };
        if params.contains_key(&letter) {
            continue;
        }
        if let Ok(value) = captures[2].parse::<f64>() {
            params.insert(letter, ParamValue::Number(value));
        }
    }

    for letter in 'a'..='z' {
        if !params.contains_key(&letter) && args.contains(letter) {
            params.insert(letter, ParamValue::Flag);
        }
    }

    params
}
