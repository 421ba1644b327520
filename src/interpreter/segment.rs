//! Motion segments emitted by the interpreter.

use serde::Serialize;

use crate::geometry::{ArcDirection, Point2, Point3, ResolvedArc};

/// One directed piece of motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MotionSegment {
    Line {
        start: Point3,
        end: Point3,
        feedrate: f64,
    },
    /// Circular (or helical, when Z changes) arc in the XY plane
    Arc {
        start: Point3,
        end: Point3,
        center: Point2,
        radius: f64,
        /// Signed sweep, positive counter-clockwise
        sweep: f64,
        direction: ArcDirection,
        feedrate: f64,
    },
    /// Pause without motion
    Dwell { duration_seconds: f64 },
}

impl MotionSegment {
    pub fn line(start: Point3, end: Point3, feedrate: f64) -> Self {
        MotionSegment::Line {
            start,
            end,
            feedrate,
        }
    }

    pub fn arc(arc: ResolvedArc, feedrate: f64) -> Self {
        MotionSegment::Arc {
            start: arc.start,
            end: arc.end,
            center: arc.center,
            radius: arc.radius,
            sweep: arc.sweep,
            direction: arc.direction,
            feedrate,
        }
    }

    pub fn dwell(duration_seconds: f64) -> Self {
        MotionSegment::Dwell { duration_seconds }
    }

    pub fn start(&self) -> Option<Point3> {
        match self {
            MotionSegment::Line { start, .. } | MotionSegment::Arc { start, .. } => Some(*start),
            MotionSegment::Dwell { .. } => None,
        }
    }

    pub fn end(&self) -> Option<Point3> {
        match self {
            MotionSegment::Line { end, .. } | MotionSegment::Arc { end, .. } => Some(*end),
            MotionSegment::Dwell { .. } => None,
        }
    }

    /// Commanded feedrate; zero for a dwell.
    pub fn feedrate(&self) -> f64 {
        match self {
            MotionSegment::Line { feedrate, .. } | MotionSegment::Arc { feedrate, .. } => {
                *feedrate
            }
            MotionSegment::Dwell { .. } => 0.0,
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            MotionSegment::Line { start, end, .. } => start.distance(*end),
            MotionSegment::Arc { .. } => self.resolved_arc().map_or(0.0, |arc| arc.length()),
            MotionSegment::Dwell { .. } => 0.0,
        }
    }

    /// The arc geometry of an `Arc` segment.
    pub fn resolved_arc(&self) -> Option<ResolvedArc> {
        match *self {
            MotionSegment::Arc {
                start,
                end,
                center,
                radius,
                sweep,
                direction,
                ..
            } => Some(ResolvedArc {
                start,
                end,
                center,
                radius,
                sweep,
                direction,
            }),
            _ => None,
        }
    }

    /// `n + 1` points from start to end inclusive (`n` clamped to at least
    /// 1); a dwell has no points.
    pub fn sample(&self, n: usize) -> Vec<Point3> {
        match self {
            MotionSegment::Line { start, end, .. } => {
                let n = n.max(1);
                (0..=n)
                    .map(|i| match i {
                        0 => *start,
                        i if i == n => *end,
                        i => Point3::lerp(*start, *end, i as f64 / n as f64),
                    })
                    .collect()
            }
            MotionSegment::Arc { .. } => self
                .resolved_arc()
                .map(|arc| arc.sample(n))
                .unwrap_or_default(),
            MotionSegment::Dwell { .. } => Vec::new(),
        }
    }
}
