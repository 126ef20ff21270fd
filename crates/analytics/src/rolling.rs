//! Trailing-window statistics.
//!
//! Every function returns one entry per input position. Position `i` covers
//! `values[i + 1 - window ..= i]`, so the first `window - 1` entries are
//! always `None`. Dispersion uses the sample (n - 1) estimator.

pub use core_types::series::fill_forward_backward;

/// Applies `f` to every full trailing window of `values`.
fn rolling<F>(values: &[f64], window: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                f(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

pub fn rolling_var(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, sample_variance)
}

pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| sample_variance(w).map(f64::sqrt))
}

/// Sample standard deviation of the strictly negative values in each window.
/// `None` when a window holds fewer than two of them.
pub fn rolling_downside_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| {
        let downside: Vec<f64> = w.iter().copied().filter(|v| *v < 0.0).collect();
        sample_variance(&downside).map(f64::sqrt)
    })
}

/// Sample covariance of two equally long series over each trailing window.
pub fn rolling_cov(x: &[f64], y: &[f64], window: usize) -> Vec<Option<f64>> {
    debug_assert_eq!(x.len(), y.len());
    let len = x.len().min(y.len());
    (0..len)
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                let range = i + 1 - window..=i;
                sample_covariance(&x[range.clone()], &y[range])
            }
        })
        .collect()
}

/// Exponentially weighted mean with `alpha = 2 / (span + 1)`.
///
/// Weights are bias-adjusted (each output is a weighted average, not a
/// recursive blend seeded with the first value). Undefined inputs contribute
/// nothing but still age the earlier observations, and their output repeats
/// the running mean. Entries before the first defined input stay `None`.
pub fn ewm_mean(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut seen = false;

    values
        .iter()
        .map(|v| {
            numerator *= decay;
            denominator *= decay;
            if let Some(x) = v {
                numerator += x;
                denominator += 1.0;
                seen = true;
            }
            seen.then(|| numerator / denominator)
        })
        .collect()
}

/// Quantile of an ascending slice, interpolating linearly between the two
/// closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// `numerator / denominator` when both are defined and the quotient is finite.
/// A zero denominator yields `None`.
pub fn checked_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d).filter(|r| r.is_finite()),
        _ => None,
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / (values.len() - 1) as f64)
}

pub fn sample_covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (mx, my) = (mean(x)?, mean(y)?);
    let s: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    Some(s / (x.len() - 1) as f64)
}
