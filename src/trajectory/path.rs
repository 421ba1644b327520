//! Flattening motion segments into a polyline of timed legs.
//!
//! Lines become one leg each, arcs are split into equal-angle chords and
//! dwells become legs that do not move. Zero-length lines are dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{EPSILON, Point3};
use crate::interpreter::MotionSegment;

/// Chords per arc when flattening.
pub const DEFAULT_ARC_SEGMENTS: usize = 100;

/// Time unit implied by the feedrate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedUnit {
    /// Length units per minute, the G-code convention
    #[default]
    PerMinute,
    PerSecond,
}

impl FeedUnit {
    /// Express a duration in seconds in this unit's time base.
    pub fn from_seconds(self, seconds: f64) -> f64 {
        match self {
            FeedUnit::PerMinute => seconds / 60.0,
            FeedUnit::PerSecond => seconds,
        }
    }
}

impl FromStr for FeedUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "per_minute" | "min" => Ok(FeedUnit::PerMinute),
            "per_second" | "sec" => Ok(FeedUnit::PerSecond),
            other => Err(format!(
                "invalid feed unit '{}', expected per_minute or per_second",
                other
            )),
        }
    }
}

impl fmt::Display for FeedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedUnit::PerMinute => f.write_str("per_minute"),
            FeedUnit::PerSecond => f.write_str("per_second"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegKind {
    Move { feedrate: f64 },
    /// Stationary for `duration`, in the feed time unit
    Dwell { duration: f64 },
}

/// Travel from the previous leg's end (or the path start) to `end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    pub end: Point3,
    pub kind: LegKind,
}

/// Raw positions with the feedrate (or dwell) of each leg between them
#[derive(Debug, Clone, PartialEq)]
pub struct RawPath {
    pub start: Point3,
    pub legs: Vec<Leg>,
    /// Legs emitted before each segment it was flattened from
    pub segment_leg_map: Vec<usize>,
}

impl RawPath {
    pub fn new(start: Point3) -> Self {
        Self {
            start,
            legs: Vec::new(),
            segment_leg_map: Vec::new(),
        }
    }

    pub fn last_position(&self) -> Point3 {
        self.legs.last().map_or(self.start, |leg| leg.end)
    }

    pub fn push_move(&mut self, end: Point3, feedrate: f64) {
        self.legs.push(Leg {
            end,
            kind: LegKind::Move { feedrate },
        });
    }

    pub fn push_dwell(&mut self, duration: f64) {
        let end = self.last_position();
        self.legs.push(Leg {
            end,
            kind: LegKind::Dwell { duration },
        });
    }

    /// Flatten segments, splitting each arc into `arc_segments` chords.
    ///
    /// A segment starting away from the current end of the path is joined
    /// to it by a straight leg at that segment's feedrate.
    pub fn from_segments(segments: &[MotionSegment], arc_segments: usize, unit: FeedUnit) -> Self {
        let start = segments
            .iter()
            .find_map(MotionSegment::start)
            .unwrap_or(Point3::ORIGIN);
        let mut path = Self::new(start);

        for segment in segments {
            path.segment_leg_map.push(path.legs.len());
            if let Some(segment_start) = segment.start() {
                if !path.last_position().approx_eq(segment_start, EPSILON) {
                    path.push_move(segment_start, segment.feedrate());
                }
            }

            match segment {
                MotionSegment::Line { end, feedrate, .. } => {
                    if !path.last_position().approx_eq(*end, EPSILON) {
                        path.push_move(*end, *feedrate);
                    }
                }
                MotionSegment::Arc { feedrate, .. } => {
                    for point in segment.sample(arc_segments).into_iter().skip(1) {
                        path.push_move(point, *feedrate);
                    }
                }
                MotionSegment::Dwell { duration_seconds } => {
                    path.push_dwell(unit.from_seconds(*duration_seconds));
                }
            }
        }

        path
    }

    /// Legs emitted before each source line, given the interpreter's
    /// segments-before-line counts. Leg `k` ends at raw position `k + 1`.
    pub fn line_leg_map(&self, line_segment_map: &[usize]) -> Vec<usize> {
        line_segment_map
            .iter()
            .map(|&segment| {
                self.segment_leg_map
                    .get(segment)
                    .copied()
                    .unwrap_or(self.legs.len())
            })
            .collect()
    }
}
