//! GCode Trajectory
//!
//! Interprets the motion subset of G-code into geometric segments and
//! time-uniform trajectories.
//!
//! This library provides:
//! - Line tokenizing with comment tags
//! - Arc resolution from center offsets or a radius
//! - A stateful interpreter producing lines, arcs and dwells
//! - Fixed time-step resampling and CSV/JSON export

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod interpreter;
pub mod parser;
pub mod trajectory;

pub use config::Config;
pub use error::{GcodeError, Result};
pub use geometry::{Point2, Point3};
pub use interpreter::{AxisMap, Diagnostic, MotionInterpreter, MotionSegment, PositionMode};
pub use parser::{parse_line, parse_reader, parse_text, tokenize_line, Command};
pub use trajectory::{resample, ResampleConfig, StepSize, Trajectory, TrajectorySample};
