//! Error types for the motion interpretation pipeline.
//!
//! Structural failures (arc geometry, kinematics) are fatal for a run and are
//! wrapped in [`GcodeError::AtLine`] by the interpreter so they can be located
//! in the source program. Unsupported codes are reported as diagnostics and
//! never abort processing.

use thiserror::Error;

/// Errors raised while tokenizing, interpreting or resampling G-code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// The line could not be read as text
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An arc gave neither I/J center offsets nor an R radius
    #[error("Arc requires either I/J center offsets or an R radius")]
    MissingArcSpecification,

    /// The arc geometry has no real solution
    #[error("Degenerate arc: {reason}")]
    DegenerateArc {
        /// What made the arc unsolvable.
        reason: String,
    },

    /// A non-zero distance was commanded with a zero or negative feedrate
    #[error("Cannot traverse distance {distance} at feedrate {feedrate}")]
    InvalidKinematics {
        /// Length of the offending move.
        distance: f64,
        /// Feedrate the move was commanded with.
        feedrate: f64,
    },

    /// The resampling step is not a positive, finite duration
    #[error("Invalid time step {0}: must be positive and finite")]
    InvalidTimeStep(f64),

    /// The code is syntactically valid but has no handler
    #[error("Unsupported command '{0}'")]
    UnsupportedCommand(String),

    /// Any of the above, located at a 1-based source line
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<GcodeError>,
    },
}

impl GcodeError {
    /// Attach a 1-based source line to this error.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            located @ GcodeError::AtLine { .. } => located,
            other => GcodeError::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    /// The source line this error was raised at, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            GcodeError::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        GcodeError::DegenerateArc {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GcodeError>;
