use anyhow::Result;
use gcode_trajectory::cli::run;

fn main() -> Result<()> {
    run()
}
