//! CSV and JSON writers for sampled geometry and trajectories.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::Point3;
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("invalid output format '{}', expected csv or json", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Write points as `x,y,z` rows or a JSON array.
pub fn write_points<W: Write>(writer: W, points: &[Point3], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_points_csv(writer, points),
        OutputFormat::Json => write_json(writer, points),
    }
}

/// Write samples as `x,y,z,vx,vy,vz,dt,t` rows or a JSON document.
pub fn write_trajectory<W: Write>(
    writer: W,
    trajectory: &Trajectory,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => write_trajectory_csv(writer, trajectory),
        OutputFormat::Json => write_json(writer, trajectory),
    }
}

fn write_points_csv<W: Write>(mut writer: W, points: &[Point3]) -> Result<()> {
    writeln!(writer, "x,y,z")?;
    for p in points {
        writeln!(writer, "{},{},{}", p.x, p.y, p.z)?;
    }
    writer.flush().context("Failed to flush CSV output")
}

fn write_trajectory_csv<W: Write>(mut writer: W, trajectory: &Trajectory) -> Result<()> {
    writeln!(writer, "x,y,z,vx,vy,vz,dt,t")?;
    for s in trajectory.samples() {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{}",
            s.position.x,
            s.position.y,
            s.position.z,
            s.velocity.x,
            s.velocity.y,
            s.velocity.z,
            s.time_delta,
            s.elapsed
        )?;
    }
    writer.flush().context("Failed to flush CSV output")
}

fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value).context("Failed to serialize JSON output")?;
    writeln!(writer)?;
    writer.flush().context("Failed to flush JSON output")
}
