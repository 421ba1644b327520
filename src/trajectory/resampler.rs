//! Fixed time-step resampling of a flattened path.
//!
//! Every leg is traversed at constant velocity `feedrate · direction`. A leg
//! of duration `T` with step `Δt` yields samples at `0, Δt, 2Δt, …`; the last
//! sample of a leg covers only the fractional remainder. The trajectory always
//! ends with the final position at rest.

use serde::Serialize;

use crate::error::{GcodeError, Result};
use crate::geometry::{EPSILON, Point3};
use crate::interpreter::MotionSegment;
use crate::trajectory::path::{FeedUnit, LegKind, RawPath, DEFAULT_ARC_SEGMENTS};

/// Fixed step used when none is configured.
pub const DEFAULT_TIME_STEP: f64 = 0.1;

/// Relative step remainder treated as a whole step.
const STEP_TOLERANCE: f64 = 1e-9;

/// How the global time step is chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepSize {
    /// Use this step as given
    Fixed(f64),
    /// Derive `10^ceil(log10(shortest_leg_time / resolution))`
    Resolution(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleConfig {
    pub step: StepSize,
    /// Chords per arc when flattening segments
    pub arc_segments: usize,
    pub feed_unit: FeedUnit,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            step: StepSize::Fixed(DEFAULT_TIME_STEP),
            arc_segments: DEFAULT_ARC_SEGMENTS,
            feed_unit: FeedUnit::default(),
        }
    }
}

/// One time-uniform sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySample {
    pub position: Point3,
    pub velocity: Point3,
    /// Time until the next sample
    pub time_delta: f64,
    /// Time since the start of the trajectory
    pub elapsed: f64,
}

/// Time-uniform samples of a whole program
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    time_step: f64,
    samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Total duration in the feed time unit.
    pub fn duration(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.elapsed)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Transform every sample position, e.g. onto a cylinder. Velocities and
    /// timing are left in the toolpath frame.
    pub fn map_positions<F>(&mut self, mut map: F)
    where
        F: FnMut(Point3) -> Point3,
    {
        for sample in &mut self.samples {
            sample.position = map(sample.position);
        }
    }
}

/// A leg ready for sampling
struct TimedLeg {
    from: Point3,
    velocity: Point3,
    time: f64,
}

/// Flatten `segments` and resample them.
pub fn resample(segments: &[MotionSegment], config: &ResampleConfig) -> Result<Trajectory> {
    let path = RawPath::from_segments(segments, config.arc_segments, config.feed_unit);
    resample_path(&path, config.step)
}

/// Resample a raw path with the given step policy.
pub fn resample_path(path: &RawPath, step: StepSize) -> Result<Trajectory> {
    let legs = timed_legs(path)?;
    let end = path.last_position();

    let shortest = legs
        .iter()
        .map(|leg| leg.time)
        .filter(|time| *time > EPSILON)
        .min_by(f64::total_cmp);

    let time_step = match (step, shortest) {
        (StepSize::Fixed(step), _) => step,
        (StepSize::Resolution(resolution), Some(shortest)) => {
            if !(resolution > 0.0 && resolution.is_finite()) {
                return Err(GcodeError::InvalidTimeStep(resolution));
            }
            // Exact powers of ten must not round up to the next decade
            let exponent = ((shortest / resolution).log10() - STEP_TOLERANCE).ceil();
            10f64.powf(exponent)
        }
        // Nothing moves: only the resting end sample remains
        (StepSize::Resolution(_), None) => 0.0,
    };

    let mut samples = Vec::new();
    let mut elapsed = 0.0;

    if shortest.is_some() {
        if !(time_step > 0.0 && time_step.is_finite()) {
            return Err(GcodeError::InvalidTimeStep(time_step));
        }
        log::debug!("Resampling {} legs with time step {}", legs.len(), time_step);

        for leg in legs.iter().filter(|leg| leg.time > EPSILON) {
            sample_leg(leg, time_step, &mut elapsed, &mut samples);
        }
    }

    samples.push(TrajectorySample {
        position: end,
        velocity: Point3::ORIGIN,
        time_delta: 0.0,
        elapsed,
    });

    Ok(Trajectory { time_step, samples })
}

fn timed_legs(path: &RawPath) -> Result<Vec<TimedLeg>> {
    let mut from = path.start;
    let mut legs = Vec::with_capacity(path.legs.len());

    for leg in &path.legs {
        let delta = leg.end - from;
        let distance = delta.norm();

        let (velocity, time) = match leg.kind {
            LegKind::Move { feedrate } => {
                if distance <= EPSILON {
                    (Point3::ORIGIN, 0.0)
                } else if feedrate <= EPSILON {
                    return Err(GcodeError::InvalidKinematics { distance, feedrate });
                } else {
                    (delta.unit_or_zero() * feedrate, distance / feedrate)
                }
            }
            LegKind::Dwell { duration } => (Point3::ORIGIN, duration.max(0.0)),
        };

        if !distance.is_finite() || !time.is_finite() {
            let feedrate = match leg.kind {
                LegKind::Move { feedrate } => feedrate,
                LegKind::Dwell { .. } => 0.0,
            };
            return Err(GcodeError::InvalidKinematics { distance, feedrate });
        }

        legs.push(TimedLeg {
            from,
            velocity,
            time,
        });
        from = leg.end;
    }

    Ok(legs)
}

fn sample_leg(
    leg: &TimedLeg,
    time_step: f64,
    elapsed: &mut f64,
    samples: &mut Vec<TrajectorySample>,
) {
    let steps = leg.time / time_step;
    let whole = steps.floor();
    let count = if steps - whole > STEP_TOLERANCE {
        whole as usize + 1
    } else {
        (whole as usize).max(1)
    };

    for k in 0..count {
        let offset = k as f64 * time_step;
        let time_delta = if k + 1 == count {
            leg.time - offset
        } else {
            time_step
        };

        samples.push(TrajectorySample {
            position: leg.from + leg.velocity * offset,
            velocity: leg.velocity,
            time_delta,
            elapsed: *elapsed,
        });
        *elapsed += time_delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn straight(length: f64, feedrate: f64) -> RawPath {
        let mut path = RawPath::new(Point3::ORIGIN);
        path.push_move(Point3::new(length, 0.0, 0.0), feedrate);
        path
    }

    #[test]
    fn whole_steps() {
        // 1 unit at 10 per time unit = 0.1, four steps of 0.025
        let trajectory = resample_path(&straight(1.0, 10.0), StepSize::Fixed(0.025)).unwrap();
        let samples = trajectory.samples();

        assert_eq!(samples.len(), 5);
        for (k, sample) in samples[..4].iter().enumerate() {
            assert!((sample.position.x - 0.25 * k as f64).abs() < TOL);
            assert_eq!(sample.velocity, Point3::new(10.0, 0.0, 0.0));
            assert!((sample.time_delta - 0.025).abs() < TOL);
        }
        assert!((trajectory.duration() - 0.1).abs() < TOL);
    }

    #[test]
    fn fractional_remainder_on_last_sample() {
        // Duration 0.25 with step 0.1: samples at 0, 0.1, 0.2; last covers 0.05
        let trajectory = resample_path(&straight(2.5, 10.0), StepSize::Fixed(0.1)).unwrap();
        let samples = trajectory.samples();

        assert_eq!(samples.len(), 4);
        assert!((samples[2].position.x - 2.0).abs() < TOL);
        assert!((samples[2].elapsed - 0.2).abs() < TOL);
        assert!((samples[2].time_delta - 0.05).abs() < TOL);
        assert!((trajectory.duration() - 0.25).abs() < TOL);
    }

    #[test]
    fn leg_shorter_than_step() {
        let trajectory = resample_path(&straight(0.5, 10.0), StepSize::Fixed(1.0)).unwrap();
        let samples = trajectory.samples();

        assert_eq!(samples.len(), 2);
        assert!((samples[0].time_delta - 0.05).abs() < TOL);
        assert_eq!(samples[1].position, Point3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn ends_at_rest() {
        let mut path = straight(1.0, 2.0);
        path.push_move(Point3::new(1.0, 3.0, 0.0), 4.0);
        let trajectory = resample_path(&path, StepSize::Fixed(0.3)).unwrap();
        let last = trajectory.samples().last().unwrap();

        assert_eq!(last.position, Point3::new(1.0, 3.0, 0.0));
        assert_eq!(last.velocity, Point3::ORIGIN);
        assert_eq!(last.time_delta, 0.0);
    }

    #[test]
    fn elapsed_is_monotonic_and_matches_deltas() {
        let mut path = straight(3.3, 7.0);
        path.push_dwell(0.2);
        path.push_move(Point3::new(0.0, 0.0, 1.7), 3.0);
        let trajectory = resample_path(&path, StepSize::Fixed(0.07)).unwrap();

        let mut expected = 0.0;
        for pair in trajectory.samples().windows(2) {
            assert!(pair[1].elapsed >= pair[0].elapsed);
            expected += pair[0].time_delta;
            assert!((pair[1].elapsed - expected).abs() < 1e-9);
        }
        let total = 3.3 / 7.0 + 0.2 + (3.3f64.hypot(1.7)) / 3.0;
        assert!((trajectory.duration() - total).abs() < 1e-9);
    }

    #[test]
    fn dwell_samples_are_stationary() {
        let mut path = straight(1.0, 10.0);
        path.push_dwell(0.3);
        let trajectory = resample_path(&path, StepSize::Fixed(0.1)).unwrap();

        let dwell: Vec<_> = trajectory
            .samples()
            .iter()
            .filter(|s| s.elapsed >= 0.1 - TOL && s.time_delta > 0.0)
            .collect();
        assert_eq!(dwell.len(), 3);
        for sample in dwell {
            assert_eq!(sample.position, Point3::new(1.0, 0.0, 0.0));
            assert_eq!(sample.velocity, Point3::ORIGIN);
        }
    }

    #[test]
    fn step_from_resolution() {
        // Shortest leg takes 0.1; 0.1 / 4 = 0.025 rounds up to 0.1
        let mut path = straight(1.0, 10.0);
        path.push_move(Point3::new(11.0, 0.0, 0.0), 10.0);
        let trajectory = resample_path(&path, StepSize::Resolution(4.0)).unwrap();

        assert!((trajectory.time_step() - 0.1).abs() < 1e-12);
        assert_eq!(trajectory.len(), 1 + 10 + 1);
    }

    #[test]
    fn zero_feedrate_is_invalid() {
        let err = resample_path(&straight(1.0, 0.0), StepSize::Fixed(0.1)).unwrap_err();
        assert!(matches!(err, GcodeError::InvalidKinematics { .. }));

        // No distance, no motion needed
        let mut path = RawPath::new(Point3::ORIGIN);
        path.push_move(Point3::ORIGIN, 0.0);
        assert!(resample_path(&path, StepSize::Fixed(0.1)).is_ok());
    }

    #[test]
    fn unbounded_legs_are_invalid() {
        let far = straight(f64::INFINITY, 10.0);
        assert!(matches!(
            resample_path(&far, StepSize::Fixed(0.1)),
            Err(GcodeError::InvalidKinematics { .. })
        ));

        let mut endless = RawPath::new(Point3::ORIGIN);
        endless.push_dwell(f64::INFINITY);
        assert!(matches!(
            resample_path(&endless, StepSize::Fixed(0.1)),
            Err(GcodeError::InvalidKinematics { .. })
        ));
    }

    #[test]
    fn invalid_steps() {
        assert!(matches!(
            resample_path(&straight(1.0, 1.0), StepSize::Fixed(0.0)),
            Err(GcodeError::InvalidTimeStep(_))
        ));
        assert!(matches!(
            resample_path(&straight(1.0, 1.0), StepSize::Resolution(-1.0)),
            Err(GcodeError::InvalidTimeStep(_))
        ));
    }

    #[test]
    fn motionless_path_is_single_rest_sample() {
        let path = RawPath::new(Point3::new(1.0, 2.0, 3.0));
        let trajectory = resample_path(&path, StepSize::Resolution(10.0)).unwrap();

        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory.samples()[0].position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(trajectory.duration(), 0.0);
    }

    #[test]
    fn mapped_positions_keep_velocity_and_timing() {
        let mut trajectory = resample_path(&straight(1.0, 10.0), StepSize::Fixed(0.05)).unwrap();
        let before = trajectory.clone();
        trajectory.map_positions(|p| Point3::new(p.x, p.y + 1.0, -p.z));

        for (mapped, original) in trajectory.samples().iter().zip(before.samples()) {
            assert_eq!(mapped.position, Point3::new(original.position.x, 1.0, 0.0));
            assert_eq!(mapped.velocity, original.velocity);
            assert_eq!(mapped.elapsed, original.elapsed);
        }
    }

    #[test]
    fn resample_segments_end_to_end() {
        let segments = [
            MotionSegment::line(Point3::ORIGIN, Point3::new(6.0, 0.0, 0.0), 60.0),
            MotionSegment::dwell(6.0),
        ];
        let trajectory = resample(&segments, &ResampleConfig::default()).unwrap();

        // 0.1 min of motion plus 0.1 min of dwell at the default step
        assert!((trajectory.duration() - 0.2).abs() < 1e-9);
        assert_eq!(
            trajectory.samples().last().unwrap().position,
            Point3::new(6.0, 0.0, 0.0)
        );
    }
}
