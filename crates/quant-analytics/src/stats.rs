//! Statistical kernels shared by the analytics components
//!
//! All estimators use sample (n-1) denominators to match the conventions of
//! the upstream data-science tooling this engine replaces. Degenerate inputs
//! (empty or single-element slices) return 0 rather than NaN; callers decide
//! whether 0 means "absorb as missing".

use nalgebra::{DMatrix, DVector};

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n-1 denominator); 0.0 when fewer than 2 values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Sample standard deviation
pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Sample covariance of two equally long series; 0.0 when fewer than 2 pairs
pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mx = mean(&xs[..n]);
    let my = mean(&ys[..n]);
    let sum: f64 = xs[..n]
        .iter()
        .zip(&ys[..n])
        .map(|(x, y)| (x - mx) * (y - my))
        .sum();
    sum / (n - 1) as f64
}

/// Per-column means of a (rows = observations, cols = assets) matrix
pub fn column_means(matrix: &DMatrix<f64>) -> DVector<f64> {
    let rows = matrix.nrows();
    if rows == 0 {
        return DVector::zeros(matrix.ncols());
    }
    DVector::from_fn(matrix.ncols(), |col, _| {
        matrix.column(col).iter().sum::<f64>() / rows as f64
    })
}

/// Sample covariance matrix of a (rows = observations, cols = assets) matrix
///
/// Zero matrix when fewer than 2 observations.
pub fn sample_covariance_matrix(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows < 2 {
        return DMatrix::zeros(cols, cols);
    }
    let means = column_means(matrix);
    DMatrix::from_fn(cols, cols, |i, j| {
        let mut sum = 0.0;
        for r in 0..rows {
            sum += (matrix[(r, i)] - means[i]) * (matrix[(r, j)] - means[j]);
        }
        sum / (rows - 1) as f64
    })
}

/// Portfolio volatility sqrt(w' * cov * w)
///
/// Numerical noise can push the quadratic form slightly negative for
/// near-singular covariance matrices; clamp before the square root.
pub fn portfolio_volatility(weights: &DVector<f64>, covariance: &DMatrix<f64>) -> f64 {
    let variance = (weights.transpose() * covariance * weights)[(0, 0)];
    variance.max(0.0).sqrt()
}

/// Empirical percentile with linear interpolation between order statistics
///
/// `pct` is in [0, 100]. Matches the numpy default estimator.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Maximum drawdown of the cumulative return curve built from `returns`
///
/// The curve is C[t] = prod(1 + r[0..=t]); drawdown is measured against the
/// running maximum of C, so the result is always <= 0.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 1.0;
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for r in returns {
        cumulative *= 1.0 + r;
        peak = peak.max(cumulative);
        if peak > 0.0 {
            worst = worst.min(cumulative / peak - 1.0);
        }
    }
    worst
}
