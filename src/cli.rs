//! Command-line driver: read a program, interpret it and write the result.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use env_logger::Env;

use crate::config::{AxisChoice, Config, RenderMode};
use crate::export::{write_points, write_trajectory};
use crate::geometry::{CylinderMap, Point3};
use crate::interpreter::{
    AxisMap, InterpreterState, MotionInterpreter, MotionSegment, AUTO_AXIS_SCAN_LIMIT,
};
use crate::parser::{parse_reader, Command};
use crate::trajectory::{resample, ResampleConfig};

/// What a run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub commands: usize,
    pub segments: usize,
    /// Points or samples written
    pub records: usize,
    pub warnings: usize,
    pub output: PathBuf,
}

/// Entry point of the `gcode-traj` binary.
pub fn run() -> Result<()> {
    let config = Config::from_args_and_env()?;
    init_logging(&config.log_level);

    if let Some(path) = &config.config_path {
        log::debug!("Using config file {}", path.display());
    }

    let summary = execute(&config)?;
    log::info!(
        "Wrote {} records from {} segments ({} commands, {} warnings) to {}",
        summary.records,
        summary.segments,
        summary.commands,
        summary.warnings,
        summary.output.display()
    );
    Ok(())
}

/// Log filter defaults to `level`; `RUST_LOG` takes precedence.
pub fn init_logging(level: &str) {
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

/// Run the whole pipeline for an already merged configuration.
pub fn execute(config: &Config) -> Result<RunSummary> {
    let input = File::open(&config.input)
        .with_context(|| format!("Failed to open G-code file: {}", config.input.display()))?;
    let commands = parse_reader(BufReader::new(input))
        .with_context(|| format!("Failed to read G-code file: {}", config.input.display()))?;

    let axes = axis_map(config, &commands);
    log::debug!("Axis letters x={} y={} z={}", axes.x, axes.y, axes.z);

    let mut interpreter = MotionInterpreter::with_state(
        axes,
        InterpreterState::with_feedrate(config.default_feedrate),
    );
    interpreter
        .process(&commands)
        .with_context(|| format!("Failed to interpret {}", config.input.display()))?;
    let warnings = interpreter.diagnostics().warnings().count();
    let segments = interpreter.into_segments();

    let output_path = config.output_path();
    let output = File::create(&output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
    let writer = BufWriter::new(output);

    let records = match config.mode {
        RenderMode::Geometry => {
            let points = geometry_points(&segments, config.curve_resolution, config.cylinder_map());
            write_points(writer, &points, config.format)?;
            points.len()
        }
        RenderMode::Trajectory => {
            let resample_config = ResampleConfig {
                step: config.time_step,
                arc_segments: config.arc_segments,
                feed_unit: config.feed_unit,
            };
            let mut trajectory = resample(&segments, &resample_config)
                .with_context(|| format!("Failed to resample {}", config.input.display()))?;
            if let Some(map) = config.cylinder_map() {
                trajectory.map_positions(|point| map.map(point));
            }
            log::info!(
                "Trajectory of {} samples, step {}, duration {}",
                trajectory.len(),
                trajectory.time_step(),
                trajectory.duration()
            );
            write_trajectory(writer, &trajectory, config.format)?;
            trajectory.len()
        }
    };

    Ok(RunSummary {
        commands: commands.len(),
        segments: segments.len(),
        records,
        warnings,
        output: output_path,
    })
}

/// Resolve the configured axis letters, falling back to `y` when automatic
/// detection finds no candidate.
pub fn axis_map(config: &Config, commands: &[Command]) -> AxisMap {
    match config.y_axis {
        AxisChoice::Letter(y) => AxisMap::new(config.x_axis, y, config.z_axis),
        AxisChoice::Auto => {
            AxisMap::with_auto_y(config.x_axis, config.z_axis, commands, AUTO_AXIS_SCAN_LIMIT)
                .unwrap_or_else(|| {
                    log::warn!("No candidate Y axis letter found; using 'y'");
                    AxisMap::new(config.x_axis, 'y', config.z_axis)
                })
        }
    }
}

/// Sample every segment at `resolution` and optionally wrap the points
/// around a cylinder. Dwells contribute nothing.
pub fn geometry_points(
    segments: &[MotionSegment],
    resolution: usize,
    cylinder: Option<CylinderMap>,
) -> Vec<Point3> {
    segments
        .iter()
        .flat_map(|segment| segment.sample(resolution))
        .map(|point| match &cylinder {
            Some(map) => map.map(point),
            None => point,
        })
        .collect()
}
