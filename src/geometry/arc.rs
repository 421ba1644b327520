//! Arc resolution for G2/G3 moves.
//!
//! An arc is given either by the center offset from its start point (I/J) or
//! by its radius (R). Resolution fixes the center, snaps the end point onto
//! the circle when the program is slightly off, and computes the signed sweep
//! angle (positive = counter-clockwise) in the XY plane. Z is interpolated
//! linearly, which turns arcs with a Z change into helices.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use super::{EPSILON, Point2, Point3};
use crate::error::{GcodeError, Result};

/// Relative deviation from the circle above which the end point is snapped.
pub const ARC_TOLERANCE: f64 = 1e-6;

/// Commanded direction of travel around the center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcDirection {
    #[serde(rename = "cw")]
    Clockwise,
    #[serde(rename = "ccw")]
    CounterClockwise,
}

impl ArcDirection {
    /// Sign of the sweep angle travelled in this direction.
    pub fn sign(self) -> f64 {
        match self {
            ArcDirection::Clockwise => -1.0,
            ArcDirection::CounterClockwise => 1.0,
        }
    }
}

/// How the program located the arc center
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcSpec {
    /// Offset of the center from the start point (I, J)
    Offset(Point2),
    /// Radius (R); a negative value selects the major arc
    Radius(f64),
}

impl ArcSpec {
    /// Build from the I, J and R words of a line. I/J take precedence over R
    /// and a missing I or J counts as zero.
    pub fn from_words(i: Option<f64>, j: Option<f64>, r: Option<f64>) -> Result<Self> {
        match (i, j, r) {
            (None, None, None) => Err(GcodeError::MissingArcSpecification),
            (None, None, Some(radius)) => Ok(ArcSpec::Radius(radius)),
            (i, j, _) => Ok(ArcSpec::Offset(Point2::new(
                i.unwrap_or(0.0),
                j.unwrap_or(0.0),
            ))),
        }
    }
}

/// A fully resolved arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedArc {
    pub start: Point3,
    /// End point, snapped onto the circle if needed
    pub end: Point3,
    pub center: Point2,
    pub radius: f64,
    /// Signed sweep, positive counter-clockwise; magnitude in (0, 2π]
    pub sweep: f64,
    pub direction: ArcDirection,
}

/// Resolve an arc from its end points and center specification.
pub fn resolve(
    start: Point3,
    end: Point3,
    spec: ArcSpec,
    direction: ArcDirection,
) -> Result<ResolvedArc> {
    let center = match spec {
        ArcSpec::Offset(offset) => start.xy() + offset,
        ArcSpec::Radius(radius) => center_from_radius(start.xy(), end.xy(), radius, direction)?,
    };
    ResolvedArc::from_center(start, end, center, direction)
}

/// Center of the arc of the given radius through `start` and `end`.
///
/// The center lies on the perpendicular bisector of the chord, on the side
/// that makes the traversal in `direction` the minor arc (the major arc for a
/// negative radius).
fn center_from_radius(
    start: Point2,
    end: Point2,
    radius: f64,
    direction: ArcDirection,
) -> Result<Point2> {
    let chord = end - start;
    let chord_length = chord.norm();
    if chord_length <= EPSILON {
        return Err(GcodeError::degenerate(
            "radius form needs distinct start and end points",
        ));
    }

    let half_chord = chord_length / 2.0;
    let radius_abs = radius.abs();
    let height_squared = radius_abs * radius_abs - half_chord * half_chord;
    if radius_abs <= EPSILON || height_squared < -ARC_TOLERANCE * radius_abs * radius_abs {
        return Err(GcodeError::degenerate(format!(
            "radius {} cannot span a chord of length {}",
            radius_abs, chord_length
        )));
    }

    let height = height_squared.max(0.0).sqrt();
    let midpoint = start + chord * 0.5;
    let normal = chord.perp() * (direction.sign() / chord_length);
    let offset = if radius < 0.0 { -height } else { height };

    Ok(midpoint + normal * offset)
}

impl ResolvedArc {
    /// Resolve an arc around an absolute center.
    pub fn from_center(
        start: Point3,
        end: Point3,
        center: Point2,
        direction: ArcDirection,
    ) -> Result<Self> {
        let radius = start.xy().distance(center);
        if radius <= EPSILON {
            return Err(GcodeError::degenerate("start point coincides with the center"));
        }

        let end_distance = end.xy().distance(center);
        let end = if (end_distance - radius).abs() > ARC_TOLERANCE * radius.max(1.0) {
            if end_distance <= EPSILON {
                return Err(GcodeError::degenerate("end point coincides with the center"));
            }
            log::warn!(
                "Arc end ({:.6}, {:.6}) is {:.6} off the circle of radius {:.6}; snapping onto it",
                end.x,
                end.y,
                end_distance - radius,
                radius
            );
            end.with_xy(center + (end.xy() - center) * (radius / end_distance))
        } else {
            end
        };

        let sweep = sweep_angle(start.xy() - center, end.xy() - center, direction);

        Ok(Self {
            start,
            end,
            center,
            radius,
            sweep,
            direction,
        })
    }

    pub fn start_angle(&self) -> f64 {
        (self.start.xy() - self.center).angle()
    }

    /// Length of the (possibly helical) path.
    pub fn length(&self) -> f64 {
        (self.radius * self.sweep).hypot(self.end.z - self.start.z)
    }

    /// Point at parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point3 {
        let angle = self.start_angle() + t * self.sweep;
        Point3::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y + self.radius * angle.sin(),
            self.start.z + t * (self.end.z - self.start.z),
        )
    }

    /// `n + 1` points from start to end inclusive, `n` clamped to at least 1.
    pub fn sample(&self, n: usize) -> Vec<Point3> {
        let n = n.max(1);
        (0..=n)
            .map(|i| match i {
                0 => self.start,
                i if i == n => self.end,
                i => self.point_at(i as f64 / n as f64),
            })
            .collect()
    }
}

/// Signed sweep from `from` to `to` (both relative to the center) travelled
/// in `direction`.
///
/// Co-linear vectors give π (opposite) or a full turn (same side). Otherwise
/// a raw angle of the wrong sign is replaced by its complement
/// `angle - sign(angle)·2π`.
fn sweep_angle(from: Point2, to: Point2, direction: ArcDirection) -> f64 {
    let cross = from.cross(to);
    let dot = from.dot(to);

    if cross.abs() <= EPSILON * from.norm() * to.norm() {
        let magnitude = if dot > 0.0 { TAU } else { PI };
        return direction.sign() * magnitude;
    }

    let angle = cross.atan2(dot);
    if angle.signum() == direction.sign() {
        angle
    } else {
        angle - angle.signum() * TAU
    }
}
