//! Motion interpreter
//!
//! Walks tokenized commands in order, tracking position, positioning mode and
//! feedrate, and emits one [`MotionSegment`] per motion or dwell command.
//! Each G/M code maps to a fixed [`Handler`]; codes without one are reported
//! as diagnostics and skipped.

use crate::error::{GcodeError, Result};
use crate::geometry::{resolve, ArcDirection, ArcSpec, EPSILON};
use crate::interpreter::diagnostics::Diagnostics;
use crate::interpreter::segment::MotionSegment;
use crate::interpreter::state::{AxisMap, InterpreterState, PositionMode};
use crate::parser::{CodeLetter, Command, CommandCode};

/// Comment tag carrying a new target speed, e.g. `; cts:1200`
pub const FEEDRATE_TAG: &str = "cts";

/// What a command code does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    SetMode(PositionMode),
    Linear,
    Arc(ArcDirection),
    Dwell,
}

impl Handler {
    pub fn for_code(code: CommandCode) -> Option<Self> {
        match (code.letter, code.number) {
            (CodeLetter::G, 0 | 1) => Some(Handler::Linear),
            (CodeLetter::G, 2) => Some(Handler::Arc(ArcDirection::Clockwise)),
            (CodeLetter::G, 3) => Some(Handler::Arc(ArcDirection::CounterClockwise)),
            (CodeLetter::G, 4) => Some(Handler::Dwell),
            (CodeLetter::G, 90) => Some(Handler::SetMode(PositionMode::Absolute)),
            (CodeLetter::G, 91) => Some(Handler::SetMode(PositionMode::Relative)),
            _ => None,
        }
    }
}

/// Stateful G-code interpreter for one program
#[derive(Debug, Clone)]
pub struct MotionInterpreter {
    axes: AxisMap,
    state: InterpreterState,
    segments: Vec<MotionSegment>,
    /// Segments emitted before each source line
    line_segment_map: Vec<usize>,
    diagnostics: Diagnostics,
}

impl Default for MotionInterpreter {
    fn default() -> Self {
        Self::new(AxisMap::default())
    }
}

impl MotionInterpreter {
    pub fn new(axes: AxisMap) -> Self {
        Self::with_state(axes, InterpreterState::default())
    }

    pub fn with_state(axes: AxisMap, state: InterpreterState) -> Self {
        Self {
            axes,
            state,
            segments: Vec::new(),
            line_segment_map: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Interpret `commands` in order, continuing from the state left by
    /// earlier calls. Returns every segment emitted so far.
    ///
    /// Arc and kinematics failures abort with the 1-based line number of the
    /// offending command, counted across calls.
    pub fn process<'a, I>(&mut self, commands: I) -> Result<&[MotionSegment]>
    where
        I: IntoIterator<Item = &'a Command>,
    {
        for command in commands {
            self.execute(command)?;
        }
        Ok(&self.segments)
    }

    /// Interpret one command, returning the segment it emitted, if any.
    pub fn execute(&mut self, command: &Command) -> Result<Option<MotionSegment>> {
        self.line_segment_map.push(self.segments.len());
        let line = self.line_segment_map.len();

        let segment = self.dispatch(line, command).map_err(|e| e.at_line(line))?;
        if let Some(segment) = segment {
            log::trace!("line {}: {:?}", line, segment);
            self.segments.push(segment);
        }

        self.apply_tags(line, command);
        Ok(segment)
    }

    fn dispatch(&mut self, line: usize, command: &Command) -> Result<Option<MotionSegment>> {
        let Some(code) = command.code else {
            if self.has_axis_words(command) {
                self.diagnostics.add_info(
                    line,
                    "Axis words without a motion code are ignored".to_string(),
                );
            }
            return Ok(None);
        };

        let Some(handler) = Handler::for_code(code) else {
            let unsupported = GcodeError::UnsupportedCommand(code.to_string());
            self.diagnostics.add_warning(line, unsupported.to_string());
            return Ok(None);
        };

        match handler {
            Handler::SetMode(mode) => {
                log::debug!("line {}: positioning mode {:?}", line, mode);
                self.state.mode = mode;
                Ok(None)
            }
            Handler::Linear => self.linear_move(command).map(Some),
            Handler::Arc(direction) => self.arc_move(command, direction).map(Some),
            Handler::Dwell => Ok(self.dwell(command)),
        }
    }

    fn linear_move(&mut self, command: &Command) -> Result<MotionSegment> {
        let start = self.state.position;
        let end = self.axes.target(command, start, self.state.mode);
        let feedrate = self.take_feedrate(command, start.distance(end))?;

        self.state.position = end;
        Ok(MotionSegment::line(start, end, feedrate))
    }

    fn arc_move(&mut self, command: &Command, direction: ArcDirection) -> Result<MotionSegment> {
        let start = self.state.position;
        let target = self.axes.target(command, start, self.state.mode);

        // I/J are offsets from the start point in either positioning mode
        let spec = ArcSpec::from_words(command.number('i'), command.number('j'), command.number('r'))?;
        let arc = resolve(start, target, spec, direction)?;
        let feedrate = self.take_feedrate(command, arc.length())?;

        self.state.position = arc.end;
        Ok(MotionSegment::arc(arc, feedrate))
    }

    /// P is in milliseconds, S in seconds; they add up.
    fn dwell(&mut self, command: &Command) -> Option<MotionSegment> {
        let millis = command.number('p').unwrap_or(0.0) + command.number('s').unwrap_or(0.0) * 1000.0;
        let seconds = millis / 1000.0;
        (seconds > 0.0).then(|| MotionSegment::dwell(seconds))
    }

    /// Feedrate for a move of length `distance`; an F word also becomes the
    /// persisted feedrate.
    fn take_feedrate(&mut self, command: &Command, distance: f64) -> Result<f64> {
        if let Some(feedrate) = command.number('f') {
            if feedrate <= EPSILON {
                return Err(GcodeError::InvalidKinematics { distance, feedrate });
            }
            self.state.feedrate = feedrate;
        }
        Ok(self.state.feedrate)
    }

    fn apply_tags(&mut self, line: usize, command: &Command) {
        let Some(tag) = command.tag(FEEDRATE_TAG) else {
            return;
        };
        match tag.as_f64() {
            Some(feedrate) if feedrate > EPSILON => {
                log::debug!("line {}: feedrate {} from comment tag", line, feedrate);
                self.state.feedrate = feedrate;
            }
            _ => self.diagnostics.add_warning(
                line,
                format!("Ignoring '{}' tag without a positive number: {:?}", FEEDRATE_TAG, tag),
            ),
        }
    }

    fn has_axis_words(&self, command: &Command) -> bool {
        [self.axes.x, self.axes.y, self.axes.z]
            .iter()
            .any(|letter| command.number(*letter).is_some())
    }

    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    pub fn segments(&self) -> &[MotionSegment] {
        &self.segments
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Number of segments emitted before each source line, indexed by
    /// 0-based line.
    pub fn line_segment_map(&self) -> &[usize] {
        &self.line_segment_map
    }

    /// Hand the accumulated segments to the caller.
    pub fn into_segments(self) -> Vec<MotionSegment> {
        self.segments
    }
}
