//! Performance metric helpers.

/// Orders per hour of simulated time.  Zero when no time has elapsed.
pub fn throughput_per_hour(completed: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    completed as f64 / elapsed_secs * 3600.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Nearest-rank percentile: the value at index `⌊n·p/100⌋` of the sorted
/// input, clamped to the last element.  Zero for empty input.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let index = (sorted.len() as f64 * p / 100.0) as usize;
    sorted[index.min(sorted.len() - 1)]
}
