//! Descriptive statistics and correlation

use super::dataset::AnalysisDataset;
use serde_json::{Map, Number, Value};

/// Summary labels, in output order
pub const SUMMARY_LABELS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Per-column summary: `{column: {count, mean, std, min, 25%, 50%, 75%, max}}`
///
/// `std` is the sample standard deviation; quartiles interpolate linearly
/// between the closest ranks. Undefined values are `null`.
pub fn describe(dataset: &AnalysisDataset) -> Map<String, Value> {
    let mut out = Map::new();

    for (index, name) in dataset.columns().iter().enumerate() {
        let values = dataset.column(index);
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let stats = [
            Some(values.len() as f64),
            mean(values),
            sample_std(values),
            sorted.first().copied(),
            quantile(&sorted, 0.25),
            quantile(&sorted, 0.50),
            quantile(&sorted, 0.75),
            sorted.last().copied(),
        ];

        let summary: Map<String, Value> = SUMMARY_LABELS
            .iter()
            .zip(stats)
            .map(|(label, stat)| (label.to_string(), number(stat)))
            .collect();

        out.insert(name.clone(), Value::Object(summary));
    }

    out
}

/// Pairwise Pearson correlation: `{column: {column: r}}`
///
/// Pairs involving a constant column are `null`.
pub fn correlation(dataset: &AnalysisDataset) -> Map<String, Value> {
    let columns = dataset.columns();
    let mut out = Map::new();

    for (i, name) in columns.iter().enumerate() {
        let row: Map<String, Value> = columns
            .iter()
            .enumerate()
            .map(|(j, other)| {
                let r = pearson(dataset.column(i), dataset.column(j));
                // Exact on the diagonal
                let r = if i == j { r.map(|_| 1.0) } else { r };
                (other.clone(), number(r))
            })
            .collect();
        out.insert(name.clone(), Value::Object(row));
    }

    out
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile of already sorted values with linear interpolation
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let mean_x = mean(x)?;
    let mean_y = mean(y)?;

    let mut num = 0.0;
    let mut den_x = 0.0;
    let mut den_y = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    if den_x == 0.0 || den_y == 0.0 {
        return None;
    }

    Some(num / (den_x * den_y).sqrt())
}

fn number(value: Option<f64>) -> Value {
    value
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
