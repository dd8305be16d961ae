// src/utils/format.rs

/// Renders a countdown as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Share of the quiz reached when viewing question `index` (0-based).
pub fn progress_percent(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((index + 1) as f64 / total as f64) * 100.0
}
