//! Resampling interpreted programs at a fixed time step.

use gcode_trajectory::trajectory::{FeedUnit, RawPath};
use gcode_trajectory::{
    parse_text, resample, GcodeError, MotionInterpreter, Point3, ResampleConfig, StepSize,
};

fn segments(text: &str) -> Vec<gcode_trajectory::MotionSegment> {
    let mut interpreter = MotionInterpreter::default();
    interpreter.process(&parse_text(text)).expect("interpret");
    interpreter.into_segments()
}

fn config(step: StepSize, feed_unit: FeedUnit) -> ResampleConfig {
    ResampleConfig {
        step,
        arc_segments: 64,
        feed_unit,
    }
}

#[test]
fn test_square_at_constant_speed() {
    let program = "G1 X10 F600\nG1 Y10\nG1 X0\nG1 Y0";
    let trajectory = resample(
        &segments(program),
        &config(StepSize::Fixed(0.1), FeedUnit::PerSecond),
    )
    .unwrap();

    // 40 units at 600 units/s
    assert!((trajectory.duration() - 40.0 / 600.0).abs() < 1e-9);
    for sample in &trajectory.samples()[..trajectory.len() - 1] {
        assert!((sample.velocity.norm() - 600.0).abs() < 1e-9);
    }
    let last = trajectory.samples().last().unwrap();
    assert_eq!(last.position, Point3::ORIGIN);
    assert_eq!(last.velocity, Point3::ORIGIN);
}

#[test]
fn test_samples_follow_the_path() {
    let program = "G1 X10 F60\nG3 X0 Y10 I-10 J0\nG4 S3";
    let trajectory = resample(
        &segments(program),
        &config(StepSize::Fixed(0.01), FeedUnit::PerMinute),
    )
    .unwrap();

    let arc_radius = |p: Point3| p.xy().norm();
    let mut previous_elapsed = 0.0;
    for sample in trajectory.samples() {
        assert!(sample.elapsed >= previous_elapsed);
        previous_elapsed = sample.elapsed;

        // Every sample sits on the x axis leg or on a chord of the arc
        let p = sample.position;
        let on_line = p.y.abs() < 1e-9 && (0.0..=10.0 + 1e-9).contains(&p.x);
        let near_arc = (arc_radius(p) - 10.0).abs() < 0.02 && p.x >= -1e-9 && p.y >= -1e-9;
        assert!(on_line || near_arc, "sample off the path: {:?}", p);
    }

    // 10 units at 60/min, then a quarter turn of radius 10, then 3 s of dwell
    let chord_length = 64.0 * 2.0 * 10.0 * (std::f64::consts::FRAC_PI_2 / 128.0).sin();
    let expected = 10.0 / 60.0 + chord_length / 60.0 + 3.0 / 60.0;
    assert!((trajectory.duration() - expected).abs() < 1e-9);
    assert_eq!(trajectory.samples().last().unwrap().position, Point3::new(0.0, 10.0, 0.0));
}

#[test]
fn test_resolution_derives_power_of_ten_step() {
    let program = "G1 X1 F10\nG1 X101";
    let trajectory = resample(
        &segments(program),
        &config(StepSize::Resolution(10.0), FeedUnit::PerMinute),
    )
    .unwrap();

    // Shortest leg lasts 0.1; a tenth of it is 0.01
    assert!((trajectory.time_step() - 0.01).abs() < 1e-15);
}

#[test]
fn test_program_without_motion() {
    let trajectory = resample(&segments("G90\nM3 S100"), &ResampleConfig::default()).unwrap();

    assert_eq!(trajectory.len(), 1);
    assert_eq!(trajectory.samples()[0].position, Point3::ORIGIN);
}

#[test]
fn test_unbounded_coordinate_is_rejected() {
    let program = format!("G1 X1{} F100", "0".repeat(400));
    let err = resample(&segments(&program), &ResampleConfig::default()).unwrap_err();

    assert!(matches!(err, GcodeError::InvalidKinematics { .. }));
}

#[test]
fn test_lines_locate_trajectory_legs() {
    let text = "G90\nG1 X1 F60\nG3 X-1 Y0 I-1 J0\nG4 S1";
    let mut interpreter = MotionInterpreter::default();
    interpreter.process(&parse_text(text)).unwrap();
    let path = RawPath::from_segments(interpreter.segments(), 8, FeedUnit::PerMinute);

    let legs = path.line_leg_map(interpreter.line_segment_map());
    assert_eq!(legs, vec![0, 0, 1, 9]);
    // The arc line starts where the first line ended
    assert_eq!(path.legs[legs[2] - 1].end, Point3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_zero_feedrate_segment_is_rejected() {
    let broken = [gcode_trajectory::MotionSegment::line(
        Point3::ORIGIN,
        Point3::new(1.0, 0.0, 0.0),
        0.0,
    )];
    let err = resample(&broken, &ResampleConfig::default()).unwrap_err();

    assert!(matches!(err, GcodeError::InvalidKinematics { feedrate, .. } if feedrate == 0.0));
}
