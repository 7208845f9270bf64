//! Display formatting helpers

/// Format milliseconds as `MM:SS`, minutes are not wrapped into hours
pub fn format_clock(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1000) % 60;
    format!("{:02}:{:02}", minutes, seconds)
}
