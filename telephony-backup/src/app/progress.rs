use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use telephony_database::Progress;

pub fn build_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed}] [{bar:.blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_position(0);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Mirror the engine's progress snapshots onto the bar
pub fn update_progress_bar(pb: &ProgressBar, progress: Progress) {
    if progress.total > 0 {
        pb.set_length(progress.total);
    }
    pb.set_position(progress.current);
    if let Some(message) = progress.message {
        pb.set_message(message);
    }
}
