//! Ordinary least squares with a held-out test split

use super::dataset::AnalysisDataset;
use crate::error::DatabaseToolError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

/// Column preferred as the regression target
pub const TARGET_COLUMN: &str = "target";

/// Seed of the train/test shuffle, fixed so results are reproducible
pub const SPLIT_SEED: u64 = 42;

/// Share of rows held out for evaluation
pub const TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionReport {
    /// One coefficient per feature, in `features` order
    pub model_coefficients: Vec<f64>,
    pub model_intercept: f64,
    /// Mean squared error on the test split
    pub mean_squared_error: f64,
    pub target: String,
    pub features: Vec<String>,
}

/// Fit `target ~ features` on a shuffled 80/20 split
///
/// The target is the `target` column when present, else the last column.
/// Every other column is a feature. A feature that is constant or a linear
/// combination of earlier features gets coefficient 0.
pub fn linear_regression(dataset: &AnalysisDataset) -> Result<RegressionReport, DatabaseToolError> {
    let n = dataset.len();
    if n < 2 {
        return Err(DatabaseToolError::InsufficientData(format!(
            "linear regression needs at least 2 rows, got {}",
            n
        )));
    }

    let target = dataset
        .position(TARGET_COLUMN)
        .or_else(|| dataset.width().checked_sub(1))
        .ok_or(DatabaseToolError::NoNumericColumns)?;
    let features: Vec<usize> = (0..dataset.width()).filter(|&c| c != target).collect();

    if features.is_empty() {
        return Err(DatabaseToolError::InsufficientData(format!(
            "linear regression needs a feature column besides '{}'",
            dataset.columns()[target]
        )));
    }

    let (train, test) = split_indices(n);
    tracing::debug!(
        train = train.len(),
        test = test.len(),
        features = features.len(),
        "Fitting linear regression"
    );

    let x_train: Vec<Vec<f64>> = train.iter().map(|&i| dataset.row(i, &features)).collect();
    let y_train: Vec<f64> = train.iter().map(|&i| dataset.column(target)[i]).collect();
    let (coefficients, intercept) = fit_ols(&x_train, &y_train);

    let squared_error: f64 = test
        .iter()
        .map(|&i| {
            let predicted = intercept
                + dataset
                    .row(i, &features)
                    .iter()
                    .zip(&coefficients)
                    .map(|(x, b)| x * b)
                    .sum::<f64>();
            (dataset.column(target)[i] - predicted).powi(2)
        })
        .sum();

    Ok(RegressionReport {
        model_coefficients: coefficients,
        model_intercept: intercept,
        mean_squared_error: squared_error / test.len() as f64,
        target: dataset.columns()[target].clone(),
        features: features
            .iter()
            .map(|&c| dataset.columns()[c].clone())
            .collect(),
    })
}

/// Shuffle `0..n` and hold out `ceil(0.2 n)` rows; both parts stay non-empty for n >= 2
fn split_indices(n: usize) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * TEST_FRACTION).ceil() as usize;
    let test = indices.split_off(n - n_test);
    (indices, test)
}

/// Least squares on mean-centred data; returns (coefficients, intercept)
fn fit_ols(x: &[Vec<f64>], y: &[f64]) -> (Vec<f64>, f64) {
    let n = x.len() as f64;
    let p = x.first().map(Vec::len).unwrap_or(0);

    let x_mean: Vec<f64> = (0..p)
        .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
        .collect();
    let y_mean = y.iter().sum::<f64>() / n;

    // Normal equations of the centred problem
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &target) in x.iter().zip(y) {
        let centred: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
        let dy = target - y_mean;
        for i in 0..p {
            xty[i] += centred[i] * dy;
            for j in 0..p {
                xtx[i][j] += centred[i] * centred[j];
            }
        }
    }

    let coefficients = solve_normal_equations(xtx, xty);
    let intercept = y_mean
        - coefficients
            .iter()
            .zip(&x_mean)
            .map(|(b, m)| b * m)
            .sum::<f64>();

    (coefficients, intercept)
}

/// Gaussian elimination with partial pivoting
///
/// Columns without a usable pivot are free and solved as 0.
#[allow(clippy::needless_range_loop)]
fn solve_normal_equations(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max);
    let tolerance = scale * 1e-10;

    let mut pivots: Vec<(usize, usize)> = Vec::new();
    let mut row = 0;

    for col in 0..n {
        if row == n {
            break;
        }

        let mut max_row = row;
        for k in (row + 1)..n {
            if a[k][col].abs() > a[max_row][col].abs() {
                max_row = k;
            }
        }

        if a[max_row][col].abs() <= tolerance {
            continue;
        }

        a.swap(row, max_row);
        b.swap(row, max_row);

        for k in (row + 1)..n {
            let factor = a[k][col] / a[row][col];
            for j in col..n {
                a[k][j] -= factor * a[row][j];
            }
            b[k] -= factor * b[row];
        }

        pivots.push((row, col));
        row += 1;
    }

    // Back substitution
    let mut x = vec![0.0; n];
    for &(r, c) in pivots.iter().rev() {
        let mut value = b[r];
        for j in (c + 1)..n {
            value -= a[r][j] * x[j];
        }
        x[c] = value / a[r][c];
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;
    use serde_json::{Value, json};

    fn dataset(value: Value) -> AnalysisDataset {
        let rows: Vec<Row> = serde_json::from_value(value).unwrap();
        AnalysisDataset::from_rows(&rows)
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = split_indices(10);
        assert_eq!((train.len(), test.len()), (8, 2));

        let (train, test) = split_indices(2);
        assert_eq!((train.len(), test.len()), (1, 1));

        let (train, test) = split_indices(11);
        assert_eq!((train.len(), test.len()), (8, 3));
    }

    #[test]
    fn test_split_is_deterministic() {
        assert_eq!(split_indices(25), split_indices(25));
    }

    #[test]
    fn test_exact_fit() {
        let rows: Vec<Value> = (0..20)
            .map(|i| json!({"x": i, "y": 3 * i + 7}))
            .collect();
        let report = linear_regression(&dataset(Value::Array(rows))).unwrap();

        assert_eq!(report.target, "y");
        assert_eq!(report.features, vec!["x"]);
        assert!((report.model_coefficients[0] - 3.0).abs() < 1e-9);
        assert!((report.model_intercept - 7.0).abs() < 1e-9);
        assert!(report.mean_squared_error < 1e-12);
    }

    #[test]
    fn test_target_column_wins_over_position() {
        let rows: Vec<Value> = (0..10)
            .map(|i| json!({"target": 2 * i, "a": i, "b": i * i}))
            .collect();
        let report = linear_regression(&dataset(Value::Array(rows))).unwrap();

        assert_eq!(report.target, "target");
        assert_eq!(report.features, vec!["a", "b"]);
        assert!((report.model_coefficients[0] - 2.0).abs() < 1e-9);
        assert!(report.model_coefficients[1].abs() < 1e-9);
    }

    #[test]
    fn test_collinear_feature_gets_zero() {
        let rows: Vec<Value> = (0..10)
            .map(|i| json!({"a": i, "twice_a": 2 * i, "y": i + 1}))
            .collect();
        let report = linear_regression(&dataset(Value::Array(rows))).unwrap();

        assert!((report.model_coefficients[0] - 1.0).abs() < 1e-9);
        assert_eq!(report.model_coefficients[1], 0.0);
        assert!((report.model_intercept - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let err = linear_regression(&dataset(json!([{"x": 1, "y": 2}]))).unwrap_err();
        assert!(err.to_string().starts_with("Insufficient data"));
    }

    #[test]
    fn test_needs_a_feature() {
        let err = linear_regression(&dataset(json!([{"y": 1}, {"y": 2}]))).unwrap_err();
        assert!(matches!(err, DatabaseToolError::InsufficientData(_)));
    }
}
