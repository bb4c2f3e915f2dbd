//! Missing-value aware reducers for almanac.
//!
//! Every value reducer skips NaN samples and returns NaN when no valid sample
//! is left. Infinite values are kept as valid samples.

/// Iterates over the non-NaN values of a slice.
fn valid(data: &[f64]) -> impl Iterator<Item = f64> + '_ {
    data.iter().copied().filter(|x| !x.is_nan())
}

/// Sum of the non-NaN values. NaN if there are none.
pub fn sum(data: &[f64]) -> f64 {
    let (n, total) = valid(data).fold((0usize, 0.0), |(n, s), x| (n + 1, s + x));
    if n == 0 { f64::NAN } else { total }
}

/// Arithmetic mean of the non-NaN values. NaN if there are none.
pub fn mean(data: &[f64]) -> f64 {
    let (n, total) = valid(data).fold((0usize, 0.0), |(n, s), x| (n + 1, s + x));
    if n == 0 {
        return f64::NAN;
    }
    total / n as f64
}

/// Sample variance of the non-NaN values with N-1 denominator.
/// NaN if fewer than 2 valid values.
pub fn variance(data: &[f64]) -> f64 {
    let n = count(data);
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(data);
    valid(data).map(|x| (x - m) * (x - m)).sum::<f64>() / (n as f64 - 1.0)
}

/// Sample standard deviation with N-1 denominator.
/// NaN if fewer than 2 valid values.
pub fn sd(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Median of the non-NaN values; input need not be sorted.
/// For an even count, averages the middle two values.
pub fn median(data: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = valid(data).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);
    median_sorted(&sorted)
}

/// Median of pre-sorted, non-empty data.
fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Smallest non-NaN value. NaN if there are none.
pub fn min(data: &[f64]) -> f64 {
    valid(data).reduce(f64::min).unwrap_or(f64::NAN)
}

/// Largest non-NaN value. NaN if there are none.
pub fn max(data: &[f64]) -> f64 {
    valid(data).reduce(f64::max).unwrap_or(f64::NAN)
}

/// Peak-to-peak range (`max - min`) of the non-NaN values.
pub fn ptp(data: &[f64]) -> f64 {
    max(data) - min(data)
}

/// Number of non-NaN values.
pub fn count(data: &[f64]) -> usize {
    valid(data).count()
}

/// Number of non-NaN values different from zero.
pub fn count_nonzero(data: &[f64]) -> usize {
    valid(data).filter(|&x| x != 0.0).count()
}

/// Median positive gap between consecutive values of a non-decreasing
/// sequence.
///
/// Repeated values (zero gaps) are ignored. Returns `None` when the
/// sequence holds fewer than two distinct values.
pub fn median_step(sorted: &[f64]) -> Option<f64> {
    let mut gaps: Vec<f64> = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&d| d > 0.0)
        .collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_by(f64::total_cmp);
    Some(median_sorted(&gaps))
}

/// Smallest positive gap between consecutive values of a non-decreasing
/// sequence, or `None` with fewer than two distinct values.
pub fn min_step(sorted: &[f64]) -> Option<f64> {
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&d| d > 0.0)
        .min_by(f64::total_cmp)
}
