//! Configuration management for the trajectory tool.
//!
//! Handles:
//! - Command-line argument parsing
//! - Optional TOML configuration file
//! - Merging both over built-in defaults

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::export::OutputFormat;
use crate::geometry::{CylinderMap, LongAxis};
use crate::interpreter::DEFAULT_FEEDRATE;
use crate::trajectory::{FeedUnit, StepSize, DEFAULT_ARC_SEGMENTS, DEFAULT_TIME_STEP};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "gcode-traj.toml";

/// Points per segment in geometry mode.
pub const DEFAULT_CURVE_RESOLUTION: usize = 20;

/// Command-line arguments for the trajectory tool
#[derive(Debug, Parser)]
#[command(name = "gcode-traj")]
#[command(about = "Interpret G-code motion into sampled geometry or time-uniform trajectories")]
#[command(version)]
pub struct Args {
    /// G-code file to interpret
    pub file: PathBuf,

    /// Output file (defaults to the input path with the format's extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Explicit configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Letter read as the X axis
    #[arg(short = 'x', long = "x-axis")]
    pub x_axis: Option<char>,

    /// Letter read as the Y axis, or "auto" to pick the most used one
    #[arg(short = 'y', long = "y-axis")]
    pub y_axis: Option<AxisChoice>,

    /// Letter read as the Z axis
    #[arg(short = 'z', long = "z-axis")]
    pub z_axis: Option<char>,

    /// Tube diameter; enables the cylindrical remap when positive
    #[arg(short = 'd', long)]
    pub diameter: Option<f64>,

    /// Tube wall thickness
    #[arg(short = 't', long)]
    pub thickness: Option<f64>,

    /// Toolpath axis running along the tube (x, y or z)
    #[arg(short = 'c', long)]
    pub long_axis: Option<LongAxis>,

    /// Points per segment in geometry mode
    #[arg(short = 'r', long)]
    pub curve_resolution: Option<usize>,

    /// geometry or trajectory
    #[arg(long)]
    pub mode: Option<RenderMode>,

    /// Fixed resampling step, in the feed time unit
    #[arg(long, conflicts_with = "time_resolution")]
    pub time_step: Option<f64>,

    /// Derive the step from the shortest leg divided by this
    #[arg(long)]
    pub time_resolution: Option<f64>,

    /// Chords per arc when resampling
    #[arg(long)]
    pub arc_segments: Option<usize>,

    /// Feedrate time unit (per_minute, per_second)
    #[arg(long)]
    pub feed_unit: Option<FeedUnit>,

    /// Feedrate used until the program sets one
    #[arg(long)]
    pub default_feedrate: Option<f64>,

    /// Output format (csv, json)
    #[arg(short = 'f', long)]
    pub format: Option<OutputFormat>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Which letter feeds an axis role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum AxisChoice {
    Letter(char),
    /// Most frequent unused letter in the program
    Auto,
}

impl FromStr for AxisChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(AxisChoice::Auto);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Ok(AxisChoice::Letter(c.to_ascii_lowercase())),
            _ => Err(format!("invalid axis '{}', expected a single letter or 'auto'", s)),
        }
    }
}

impl TryFrom<String> for AxisChoice {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AxisChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisChoice::Letter(c) => write!(f, "{}", c),
            AxisChoice::Auto => f.write_str("auto"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Per-segment sampled points
    #[default]
    Geometry,
    /// Time-uniform samples with velocities
    Trajectory,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geometry" => Ok(RenderMode::Geometry),
            "trajectory" => Ok(RenderMode::Trajectory),
            other => Err(format!(
                "invalid mode '{}', expected geometry or trajectory",
                other
            )),
        }
    }
}

/// Contents of a TOML configuration file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub log_level: Option<String>,
    pub axes: AxesSection,
    pub interpreter: InterpreterSection,
    pub render: RenderSection,
    pub trajectory: TrajectorySection,
    pub cylinder: CylinderSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AxesSection {
    pub x: Option<char>,
    pub y: Option<AxisChoice>,
    pub z: Option<char>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpreterSection {
    pub default_feedrate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub curve_resolution: Option<usize>,
    pub arc_segments: Option<usize>,
    pub mode: Option<RenderMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrajectorySection {
    pub time_step: Option<f64>,
    pub time_resolution: Option<f64>,
    pub feed_unit: Option<FeedUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CylinderSection {
    pub diameter: Option<f64>,
    pub thickness: Option<f64>,
    pub long_axis: Option<LongAxis>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub format: Option<OutputFormat>,
}

impl FileConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str, source_path: Option<&Path>) -> Result<Self> {
        toml::from_str(content).with_context(|| match source_path {
            Some(path) => format!("Failed to parse config TOML: {}", path.display()),
            None => "Failed to parse config TOML".to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content, Some(path))
    }

    /// Find the configuration file to use, if any.
    ///
    /// An explicit path is returned as is; otherwise the working directory
    /// is searched before the user config directory.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("gcode-traj").join("config.toml"))
            .filter(|path| path.is_file())
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    /// File the settings were read from, if any
    pub config_path: Option<PathBuf>,
    pub x_axis: char,
    pub y_axis: AxisChoice,
    pub z_axis: char,
    pub default_feedrate: f64,
    pub mode: RenderMode,
    pub curve_resolution: usize,
    pub arc_segments: usize,
    pub time_step: StepSize,
    pub feed_unit: FeedUnit,
    pub diameter: f64,
    pub thickness: f64,
    pub long_axis: LongAxis,
    pub format: OutputFormat,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments, reading the config file
    /// they point to (or the first one found).
    pub fn from_args(args: Args) -> Result<Self> {
        let config_path = FileConfig::locate(args.config.as_deref());
        let file = match &config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut config = Self::merge(args, file)?;
        config.config_path = config_path;
        Ok(config)
    }

    /// Layer arguments over file settings over defaults, then validate.
    pub fn merge(args: Args, file: FileConfig) -> Result<Self> {
        let time_step = match (args.time_step, args.time_resolution) {
            (Some(step), _) => StepSize::Fixed(step),
            (None, Some(resolution)) => StepSize::Resolution(resolution),
            (None, None) => match (file.trajectory.time_step, file.trajectory.time_resolution) {
                (Some(step), _) => StepSize::Fixed(step),
                (None, Some(resolution)) => StepSize::Resolution(resolution),
                (None, None) => StepSize::Fixed(DEFAULT_TIME_STEP),
            },
        };

        let config = Config {
            input: args.file,
            output: args.output,
            config_path: None,
            x_axis: args.x_axis.or(file.axes.x).unwrap_or('x').to_ascii_lowercase(),
            y_axis: args.y_axis.or(file.axes.y).unwrap_or(AxisChoice::Letter('y')),
            z_axis: args.z_axis.or(file.axes.z).unwrap_or('z').to_ascii_lowercase(),
            default_feedrate: args
                .default_feedrate
                .or(file.interpreter.default_feedrate)
                .unwrap_or(DEFAULT_FEEDRATE),
            mode: args.mode.or(file.render.mode).unwrap_or_default(),
            curve_resolution: args
                .curve_resolution
                .or(file.render.curve_resolution)
                .unwrap_or(DEFAULT_CURVE_RESOLUTION),
            arc_segments: args
                .arc_segments
                .or(file.render.arc_segments)
                .unwrap_or(DEFAULT_ARC_SEGMENTS),
            time_step,
            feed_unit: args.feed_unit.or(file.trajectory.feed_unit).unwrap_or_default(),
            diameter: args.diameter.or(file.cylinder.diameter).unwrap_or(0.0),
            thickness: args.thickness.or(file.cylinder.thickness).unwrap_or(0.0),
            long_axis: args.long_axis.or(file.cylinder.long_axis).unwrap_or_default(),
            format: args.format.or(file.output.format).unwrap_or_default(),
            log_level: args
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.default_feedrate > 0.0,
            "default feedrate must be positive, got {}",
            self.default_feedrate
        );
        ensure!(self.curve_resolution >= 1, "curve resolution must be at least 1");
        ensure!(self.arc_segments >= 1, "arc segments must be at least 1");
        let step = match self.time_step {
            StepSize::Fixed(step) | StepSize::Resolution(step) => step,
        };
        ensure!(
            step > 0.0 && step.is_finite(),
            "time step and resolution must be positive, got {}",
            step
        );
        ensure!(
            self.diameter >= 0.0 && self.thickness >= 0.0,
            "cylinder diameter and thickness must not be negative"
        );
        Ok(())
    }

    /// Cylindrical remap, when a tube diameter is configured.
    pub fn cylinder_map(&self) -> Option<CylinderMap> {
        (self.diameter > 0.0)
            .then(|| CylinderMap::for_tube(self.diameter, self.thickness, self.long_axis))
    }

    /// Where results are written.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension(self.format.extension()))
    }
}
