//! Small descriptive statistics shared by the reports.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Percentile with linear interpolation between closest ranks. `sorted` must be ascending.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (p.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn median(sorted: &[f64]) -> Option<f64> {
    percentile(sorted, 50.0)
}

pub fn sorted_lengths(values: &[usize]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}
