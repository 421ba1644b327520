//! Time-Uniform Trajectories
//!
//! Flattens motion segments into a timed polyline and resamples it at a
//! fixed time step.

pub mod path;
pub mod resampler;

pub use path::{FeedUnit, Leg, LegKind, RawPath, DEFAULT_ARC_SEGMENTS};
pub use resampler::{
    resample, resample_path, ResampleConfig, StepSize, Trajectory, TrajectorySample,
    DEFAULT_TIME_STEP,
};
