use chrono::{DateTime, Utc};

/// Formats a second count as zero-padded `MM:SS`. Minutes are not wrapped
/// into hours.
pub fn format_clock(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

pub fn is_time_low(remaining_seconds: u32, threshold_seconds: u32) -> bool {
    remaining_seconds < threshold_seconds
}

/// Whole seconds between two instants, never negative. A missing start
/// counts as zero elapsed time.
pub fn elapsed_seconds(started_at: Option<DateTime<Utc>>, ended_at: DateTime<Utc>) -> u64 {
    started_at
        .map(|start| (ended_at - start).num_seconds().max(0) as u64)
        .unwrap_or(0)
}
