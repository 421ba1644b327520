//! GCode Parser
//!
//! Line-oriented tokenization of G-code text into [`Command`] values.
//! Interpretation of the commands lives in [`crate::interpreter`].

pub mod ast;
pub mod lexer;

pub use ast::{parse_comment_tags, CodeLetter, Command, CommandCode, ParamValue, TagValue};
pub use lexer::{tokenize_bytes, tokenize_line};

use std::io::BufRead;

use crate::error::{GcodeError, Result};

/// Parse a single line of GCode into structured data
pub fn parse_line(line: &str) -> Command {
    lexer::tokenize_line(line)
}

/// Parse every line of a complete text.
pub fn parse_text(text: &str) -> Vec<Command> {
    text.lines().map(lexer::tokenize_line).collect()
}

/// Streaming iterator yielding one [`Command`] per line of a `BufRead` source.
///
/// Lines that are not valid text yield a [`GcodeError::MalformedInput`]
/// located at their 1-based line number.
pub struct CommandIterator<R: BufRead> {
    reader: R,
    line_buffer: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> CommandIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buffer: Vec::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for CommandIterator<R> {
    type Item = Result<Command>;

    fn next(&mut self) -> Option<Self::Item> {
        self.line_buffer.clear();
        match self.reader.read_until(b'\n', &mut self.line_buffer) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                let line = trim_line_ending(&self.line_buffer);
                Some(lexer::tokenize_bytes(line).map_err(|e| e.at_line(self.line_number)))
            }
            Err(e) => {
                self.line_number += 1;
                Some(Err(GcodeError::MalformedInput(e.to_string()).at_line(self.line_number)))
            }
        }
    }
}

/// Read every line of a source, stopping at the first malformed one.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<Command>> {
    CommandIterator::new(reader).collect()
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
