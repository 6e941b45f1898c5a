//! Descriptive statistics over polars columns.
//!
//! Everything here works on plain `f64` samples extracted from a series:
//! nulls and non-finite floats are skipped, so all statistics are computed
//! over the valid subset only. Skewness and kurtosis use the adjusted
//! (sample-corrected) estimators so the numbers line up with what analysts
//! expect from standard tooling.

use polars::prelude::*;

pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Per-row `f64` view of a series; nulls and NaNs map to `None`.
pub fn column_f64s(s: &Series) -> Vec<Option<f64>> {
    (0..s.len())
        .map(|i| {
            let any = s.get(i).unwrap_or(AnyValue::Null);
            match any {
                AnyValue::Int8(v) => Some(v as f64),
                AnyValue::Int16(v) => Some(v as f64),
                AnyValue::Int32(v) => Some(v as f64),
                AnyValue::Int64(v) => Some(v as f64),
                AnyValue::UInt8(v) => Some(v as f64),
                AnyValue::UInt16(v) => Some(v as f64),
                AnyValue::UInt32(v) => Some(v as f64),
                AnyValue::UInt64(v) => Some(v as f64),
                AnyValue::Float32(v) => {
                    if v.is_finite() {
                        Some(v as f64)
                    } else {
                        None
                    }
                }
                AnyValue::Float64(v) => {
                    if v.is_finite() {
                        Some(v)
                    } else {
                        None
                    }
                }
                _ => None,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ColumnStats {
    pub count: u64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

/// Full describe-style statistics for one numeric series.
pub fn column_stats(s: &Series) -> ColumnStats {
    // Welford's algorithm for mean and variance.
    let mut n: u64 = 0;
    let mut mean: f64 = 0.0;
    let mut m2: f64 = 0.0;
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    let mut values: Vec<f64> = Vec::new();

    for opt_x in column_f64s(s) {
        if let Some(x) = opt_x {
            n += 1;
            let delta = x - mean;
            mean += delta / (n as f64);
            let delta2 = x - mean;
            m2 += delta * delta2;
            if x < min_v {
                min_v = x;
            }
            if x > max_v {
                max_v = x;
            }
            values.push(x);
        }
    }

    if n == 0 {
        return ColumnStats::default();
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let std = if n > 1 {
        Some((m2 / ((n as f64) - 1.0)).sqrt())
    } else {
        None
    };

    // Central moments for skewness/kurtosis.
    let nf = n as f64;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for x in &values {
        let d = x - mean;
        m3 += d * d * d;
        m4 += d * d * d * d;
    }
    m3 /= nf;
    m4 /= nf;
    let m2b = m2 / nf; // biased second central moment

    // Adjusted Fisher-Pearson skewness; defined for n >= 3 and non-constant data.
    let skewness = if n >= 3 && m2b > 0.0 {
        let g1 = m3 / m2b.powf(1.5);
        Some(g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0))
    } else {
        None
    };

    // Unbiased excess kurtosis; defined for n >= 4 and non-constant data.
    let kurtosis = if n >= 4 && m2b > 0.0 {
        let g2 = m4 / (m2b * m2b) - 3.0;
        Some(((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0)))
    } else {
        None
    };

    ColumnStats {
        count: n,
        mean: Some(mean),
        std,
        min: Some(min_v),
        q1: quantile_sorted(&values, 0.25),
        median: quantile_sorted(&values, 0.5),
        q3: quantile_sorted(&values, 0.75),
        max: Some(max_v),
        skewness,
        kurtosis,
    }
}

/// Linear-interpolation quantile of an already-sorted sample.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * ((sorted.len() - 1) as f64);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        Some(sorted[lo])
    } else {
        let frac = pos - (lo as f64);
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
    }
}

/// Pearson correlation over pairwise-complete finite entries. Undefined for
/// fewer than two complete pairs or a constant column; those serialize as
/// JSON null rather than a fake zero.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let mut px: Vec<f64> = Vec::new();
    let mut py: Vec<f64> = Vec::new();
    let len = xs.len().min(ys.len());
    for k in 0..len {
        if let (Some(a), Some(b)) = (xs[k], ys[k]) {
            px.push(a);
            py.push(b);
        }
    }
    if px.len() < 2 {
        return None;
    }
    let nobs = px.len() as f64;
    let mean_x = px.iter().sum::<f64>() / nobs;
    let mean_y = py.iter().sum::<f64>() / nobs;
    let mut num = 0.0;
    let mut den_x = 0.0;
    let mut den_y = 0.0;
    for idx in 0..px.len() {
        let dx = px[idx] - mean_x;
        let dy = py[idx] - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }
    if den_x > 0.0 && den_y > 0.0 {
        Some((num / (den_x.sqrt() * den_y.sqrt())).clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Pairwise correlation matrix for the named columns of `df`; undefined
/// entries stay `None`.
pub fn correlation_matrix(df: &DataFrame, names: &[String]) -> Vec<Vec<Option<f64>>> {
    let cols: Vec<Vec<Option<f64>>> = names
        .iter()
        .filter_map(|name| df.column(name).ok())
        .map(|c| column_f64s(c.as_materialized_series()))
        .collect();
    let n = cols.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in 0..n {
            matrix[i][j] = pearson(&cols[i], &cols[j]);
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_known_sample() {
        let s = Series::new("a".into(), &[1.0f64, 2.0, 3.0, 4.0, 5.0]);
        let stats = column_stats(&s);
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, Some(3.0));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(5.0));
        assert_eq!(stats.q1, Some(2.0));
        assert_eq!(stats.median, Some(3.0));
        assert_eq!(stats.q3, Some(4.0));
        // sample std of 1..5 is sqrt(2.5)
        assert!((stats.std.unwrap() - 2.5f64.sqrt()).abs() < 1e-12);
        // symmetric sample has zero skew
        assert!(stats.skewness.unwrap().abs() < 1e-12);
    }

    #[test]
    fn stats_skip_nulls() {
        let s = Series::new("a".into(), &[Some(1.0f64), None, Some(3.0)]);
        let stats = column_stats(&s);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, Some(2.0));
        assert_eq!(stats.skewness, None);
    }

    #[test]
    fn quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn perfect_correlation() {
        let xs: Vec<Option<f64>> = vec![Some(1.0), Some(2.0), Some(3.0)];
        let ys: Vec<Option<f64>> = vec![Some(2.0), Some(4.0), Some(6.0)];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);

        let neg: Vec<Option<f64>> = vec![Some(3.0), Some(2.0), Some(1.0)];
        assert!((pearson(&xs, &neg).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_ignores_incomplete_pairs() {
        let xs: Vec<Option<f64>> = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let ys: Vec<Option<f64>> = vec![Some(2.0), Some(9.0), Some(6.0), Some(8.0)];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_correlation_is_undefined() {
        let constant: Vec<Option<f64>> = vec![Some(5.0), Some(5.0), Some(5.0)];
        let ys: Vec<Option<f64>> = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pearson(&constant, &ys), None);
        assert_eq!(pearson(&constant, &constant), None);

        // a single complete pair is not enough
        let xs: Vec<Option<f64>> = vec![Some(1.0), None];
        assert_eq!(pearson(&xs, &ys), None);
    }
}
