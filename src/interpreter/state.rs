//! Interpreter state and axis configuration.

use serde::Serialize;

use crate::geometry::Point3;
use crate::parser::{Command, ParamValue};

/// Feedrate used until a program sets one.
pub const DEFAULT_FEEDRATE: f64 = 100.0;

/// Commands scanned when auto-detecting the Y axis letter.
pub const AUTO_AXIS_SCAN_LIMIT: usize = 1000;

/// Letters that never name an axis: feed, arc words, spindle and dwell.
const NON_AXIS_LETTERS: [char; 6] = ['f', 'i', 'j', 'r', 's', 'p'];

/// Whether coordinates are absolute or deltas from the current position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PositionMode {
    #[default]
    Absolute,
    Relative,
}

/// Source letters feeding the X, Y and Z roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMap {
    pub x: char,
    pub y: char,
    pub z: char,
}

impl Default for AxisMap {
    fn default() -> Self {
        Self {
            x: 'x',
            y: 'y',
            z: 'z',
        }
    }
}

impl AxisMap {
    pub fn new(x: char, y: char, z: char) -> Self {
        Self {
            x: x.to_ascii_lowercase(),
            y: y.to_ascii_lowercase(),
            z: z.to_ascii_lowercase(),
        }
    }

    /// Use the first letter, in order of appearance in `commands`, that is
    /// neither the X nor the Z letter as the Y source.
    ///
    /// Returns `None` when no candidate letter appears.
    pub fn with_auto_y(x: char, z: char, commands: &[Command], limit: usize) -> Option<Self> {
        let x = x.to_ascii_lowercase();
        let z = z.to_ascii_lowercase();

        let (y, count) = detect_axis_letters(commands, limit)
            .into_iter()
            .find(|(letter, _)| *letter != x && *letter != z)?;
        log::info!("Auto-detected '{}' as the Y axis ({} occurrences)", y, count);
        Some(Self { x, y, z })
    }

    /// Target of a move from `current`, reading the mapped letters of `command`.
    ///
    /// Absolute: an axis without a numeric word keeps its value.
    /// Relative: an axis without a numeric word contributes no delta.
    pub fn target(&self, command: &Command, current: Point3, mode: PositionMode) -> Point3 {
        let word = |letter: char| command.number(letter);
        match mode {
            PositionMode::Absolute => Point3::new(
                word(self.x).unwrap_or(current.x),
                word(self.y).unwrap_or(current.y),
                word(self.z).unwrap_or(current.z),
            ),
            PositionMode::Relative => Point3::new(
                current.x + word(self.x).unwrap_or(0.0),
                current.y + word(self.y).unwrap_or(0.0),
                current.z + word(self.z).unwrap_or(0.0),
            ),
        }
    }
}

/// Count how often each axis-like letter carries a number in the first
/// `limit` commands that have any parameters.
///
/// Letters are listed in order of first appearance; letters first seen on
/// the same line are listed alphabetically.
pub fn detect_axis_letters(commands: &[Command], limit: usize) -> Vec<(char, usize)> {
    let mut counts: Vec<(char, usize)> = Vec::new();

    for command in commands.iter().filter(|c| !c.params.is_empty()).take(limit) {
        for (letter, value) in &command.params {
            if NON_AXIS_LETTERS.contains(letter) || matches!(value, ParamValue::Flag) {
                continue;
            }
            match counts.iter_mut().find(|(seen, _)| seen == letter) {
                Some((_, count)) => *count += 1,
                None => counts.push((*letter, 1)),
            }
        }
    }

    counts
}

/// Everything the interpreter mutates while walking a program
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpreterState {
    pub position: Point3,
    pub mode: PositionMode,
    pub feedrate: f64,
}

impl Default for InterpreterState {
    fn default() -> Self {
        Self {
            position: Point3::ORIGIN,
            mode: PositionMode::Absolute,
            feedrate: DEFAULT_FEEDRATE,
        }
    }
}

impl InterpreterState {
    pub fn with_feedrate(feedrate: f64) -> Self {
        Self {
            feedrate,
            ..Self::default()
        }
    }
}
