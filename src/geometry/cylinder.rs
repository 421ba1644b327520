//! Folding a planar toolpath onto the surface of a tube.
//!
//! One axis runs along the tube, the in-plane coordinate across it is read as
//! arc length around the circumference and the remaining one as height above
//! the surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Point3;

/// Radius substituted when the tube diameter is zero.
pub const MIN_RADIUS: f64 = 0.001;

/// Axis of the toolpath that runs along the tube
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongAxis {
    #[default]
    X,
    Y,
    Z,
}

impl FromStr for LongAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(LongAxis::X),
            "y" => Ok(LongAxis::Y),
            "z" => Ok(LongAxis::Z),
            other => Err(format!("invalid long axis '{}', expected x, y or z", other)),
        }
    }
}

impl fmt::Display for LongAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LongAxis::X => "x",
            LongAxis::Y => "y",
            LongAxis::Z => "z",
        };
        f.write_str(name)
    }
}

/// Cylindrical remap of toolpath points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderMap {
    pub diameter: f64,
    pub long_axis: LongAxis,
    pub xy_scale: f64,
}

impl CylinderMap {
    pub fn new(diameter: f64, long_axis: LongAxis, xy_scale: f64) -> Self {
        Self {
            diameter,
            long_axis,
            xy_scale,
        }
    }

    /// Map for a tube of the given wall thickness, projecting onto its
    /// outer surface.
    pub fn for_tube(diameter: f64, thickness: f64, long_axis: LongAxis) -> Self {
        Self::new(diameter, long_axis, xy_scale(diameter, thickness))
    }

    pub fn map(&self, point: Point3) -> Point3 {
        let scaled = point * self.xy_scale;
        let (along, around, radial) = match self.long_axis {
            LongAxis::X => (scaled.x, scaled.y, scaled.z),
            LongAxis::Y => (scaled.y, scaled.x, scaled.z),
            LongAxis::Z => (scaled.z, scaled.y, scaled.x),
        };

        let radius = self.diameter / 2.0;
        let height = radius + radial;
        let theta = if radius > 0.0 {
            around / radius
        } else {
            around / MIN_RADIUS
        };

        Point3::new(
            along,
            self.xy_scale * height * theta.cos(),
            self.xy_scale * height * theta.sin(),
        )
    }
}

/// Scale from the inner to the outer surface of a tube; 1 when either
/// dimension is not positive.
pub fn xy_scale(diameter: f64, thickness: f64) -> f64 {
    if diameter > 0.0 && thickness > 0.0 {
        (diameter + thickness) / diameter
    } else {
        1.0
    }
}
