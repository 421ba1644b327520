//! Running the `gcode-traj` binary on temporary files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const PROGRAM: &str = "G90\nG1 X10 F600\nG2 X20 Y0 I5 J0\nG4 P1000\nG1 Y5\n";

fn bin_path() -> String {
    std::env::var("CARGO_BIN_EXE_gcode-traj")
        .unwrap_or_else(|_| "target/debug/gcode-traj".to_string())
}

fn write_program(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("part.gcode");
    fs::write(&path, text).expect("write program");
    path
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run gcode-traj")
}

#[test]
fn test_geometry_csv_next_to_input() {
    let dir = TempDir::new().unwrap();
    let input = write_program(&dir, PROGRAM);

    let output = run(dir.path(), &[input.to_str().unwrap(), "-r", "4"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let csv = fs::read_to_string(dir.path().join("part.csv")).expect("csv written");
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows[0], "x,y,z");
    // Three moves of five points each
    assert_eq!(rows.len(), 1 + 3 * 5);
    assert_eq!(rows[1], "0,0,0");
    assert_eq!(*rows.last().unwrap(), "20,5,0");
}

#[test]
fn test_trajectory_json_to_explicit_output() {
    let dir = TempDir::new().unwrap();
    let input = write_program(&dir, PROGRAM);
    let out = dir.path().join("traj.json");

    let output = run(
        dir.path(),
        &[
            input.to_str().unwrap(),
            "--mode",
            "trajectory",
            "--format",
            "json",
            "--time-step",
            "0.001",
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let samples = value["samples"].as_array().unwrap();
    let last = samples.last().unwrap();

    assert_eq!(value["time_step"], 0.001);
    assert_eq!(last["position"]["x"], 20.0);
    assert_eq!(last["position"]["y"], 5.0);
    assert_eq!(last["velocity"]["x"], 0.0);
    // The half circle is walked as 100 chords; one second of dwell is 1/60 of a minute
    let chords = 100.0 * 2.0 * 5.0 * (std::f64::consts::PI / 200.0).sin();
    let expected = (10.0 + chords + 5.0) / 600.0 + 1.0 / 60.0;
    assert!((last["elapsed"].as_f64().unwrap() - expected).abs() < 1e-9);
}

fn read_csv_rows(path: &Path) -> Vec<Vec<f64>> {
    fs::read_to_string(path)
        .expect("csv written")
        .lines()
        .skip(1)
        .map(|row| row.split(',').map(|v| v.parse().unwrap()).collect())
        .collect()
}

#[test]
fn test_clockwise_arc_geometry() {
    let dir = TempDir::new().unwrap();
    let input = write_program(&dir, "G2 X10 Y0 I5 J0\n");

    let output = run(dir.path(), &[input.to_str().unwrap(), "-r", "4"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let rows = read_csv_rows(&dir.path().join("part.csv"));
    assert_eq!(rows.len(), 5);
    for row in &rows {
        assert!(((row[0] - 5.0).hypot(row[1]) - 5.0).abs() < 1e-9, "off circle: {:?}", row);
        assert_eq!(row[2], 0.0);
    }
    assert_eq!(rows[0], vec![0.0, 0.0, 0.0]);
    assert_eq!(rows[4], vec![10.0, 0.0, 0.0]);
    // Clockwise from the left end passes over the top
    assert!((rows[2][0] - 5.0).abs() < 1e-9);
    assert!((rows[2][1] - 5.0).abs() < 1e-9);
}

#[test]
fn test_trajectory_on_cylinder() {
    let dir = TempDir::new().unwrap();
    let input = write_program(&dir, "G1 Y5 F600\n");

    let output = run(
        dir.path(),
        &[
            input.to_str().unwrap(),
            "--mode",
            "trajectory",
            "--time-step",
            "0.001",
            "-d",
            "10",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let rows = read_csv_rows(&dir.path().join("part.csv"));
    assert!(rows.len() > 2);
    for row in &rows {
        // On the surface of a tube of radius 5 running along X
        assert!(row[0].abs() < 1e-12);
        assert!((row[1].hypot(row[2]) - 5.0).abs() < 1e-9, "off surface: {:?}", row);
    }
    // Velocities stay in the toolpath frame
    assert_eq!(&rows[0][3..6], &[0.0, 600.0, 0.0]);

    // Five units around a radius of 5 is one radian
    let last = rows.last().unwrap();
    assert!((last[1] - 5.0 * 1f64.cos()).abs() < 1e-9);
    assert!((last[2] - 5.0 * 1f64.sin()).abs() < 1e-9);
}

#[test]
fn test_local_config_file_is_used() {
    let dir = TempDir::new().unwrap();
    write_program(&dir, "G1 X1 A2\nG1 X2 A4\n");
    fs::write(
        dir.path().join("gcode-traj.toml"),
        "[axes]\ny = \"auto\"\n\n[render]\ncurve_resolution = 1\n",
    )
    .unwrap();

    let output = run(dir.path(), &["part.gcode"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let csv = fs::read_to_string(dir.path().join("part.csv")).unwrap();
    assert_eq!(csv, "x,y,z\n0,0,0\n1,2,0\n1,2,0\n2,4,0\n");
}

#[test]
fn test_explicit_config_overridden_by_flags() {
    let dir = TempDir::new().unwrap();
    let input = write_program(&dir, "G1 X3\n");
    let config = dir.path().join("custom.toml");
    fs::write(&config, "[output]\nformat = \"json\"\n[render]\ncurve_resolution = 7\n").unwrap();

    let output = run(
        dir.path(),
        &[
            input.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "-r",
            "1",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("part.json")).unwrap()).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
}

#[test]
fn test_arc_error_fails_with_line_number() {
    let dir = TempDir::new().unwrap();
    let input = write_program(&dir, "G1 X1\nG2 X5 Y0\n");

    let output = run(dir.path(), &[input.to_str().unwrap()]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "stderr: {}", stderr);
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &["does-not-exist.gcode"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to open G-code file"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_program(&dir, "G1 X1\n");
    fs::write(dir.path().join("gcode-traj.toml"), "[render]\nmode = \"sideways\"\n").unwrap();

    let output = run(dir.path(), &[input.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse config TOML"));
}
