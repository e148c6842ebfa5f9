use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Positions are tenths of a percent of the input file.
pub const PROGRESS_SCALE: u64 = 1000;

pub fn create_progress_bar(multi: &MultiProgress) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new(PROGRESS_SCALE));
    pb.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {percent}%\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
    )?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("reading tags");
    Ok(pb)
}

pub fn percent_to_position(percent: f64) -> u64 {
    ((percent / 100.0) * PROGRESS_SCALE as f64)
        .round()
        .clamp(0.0, PROGRESS_SCALE as f64) as u64
}

#[test]
fn test_percent_to_position() {
    assert_eq!(percent_to_position(0.0), 0);
    assert_eq!(percent_to_position(42.37), 424);
    assert_eq!(percent_to_position(100.0), PROGRESS_SCALE);
    assert_eq!(percent_to_position(100.4), PROGRESS_SCALE);
}
