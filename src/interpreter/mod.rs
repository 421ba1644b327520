//! Motion Interpretation
//!
//! Turns tokenized commands into motion segments.

pub mod diagnostics;
pub mod engine;
pub mod segment;
pub mod state;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use engine::{Handler, MotionInterpreter, FEEDRATE_TAG};
pub use segment::MotionSegment;
pub use state::{
    detect_axis_letters, AxisMap, InterpreterState, PositionMode, AUTO_AXIS_SCAN_LIMIT,
    DEFAULT_FEEDRATE,
};
