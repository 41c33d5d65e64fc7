//! Numeric view of a query result

use crate::row::Row;
use serde_json::Value;

/// Numeric columns of a result set, missing values already imputed
///
/// Stored column-major; every column has one value per input row.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisDataset {
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
    rows: usize,
}

impl AnalysisDataset {
    /// Keep the numeric columns of `rows` and fill their gaps with the column mean
    ///
    /// A column is numeric when it holds at least one non-null value and all
    /// of its non-null values are numbers. Columns keep the order in which
    /// they first appear.
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut names: Vec<&str> = Vec::new();
        for row in rows {
            for name in row.keys() {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }

        let mut columns = Vec::new();
        let mut values = Vec::new();

        for name in names {
            if let Some(column) = numeric_column(rows, name) {
                columns.push(name.to_string());
                values.push(impute_mean(column));
            }
        }

        Self {
            columns,
            values,
            rows: rows.len(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &[f64] {
        &self.values[index]
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Number of numeric columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Values of row `index` for the given columns
    pub(crate) fn row(&self, index: usize, columns: &[usize]) -> Vec<f64> {
        columns.iter().map(|&c| self.values[c][index]).collect()
    }
}

fn numeric_column(rows: &[Row], name: &str) -> Option<Vec<Option<f64>>> {
    let mut column = Vec::with_capacity(rows.len());
    let mut seen_value = false;

    for row in rows {
        match row.get(name) {
            None | Some(Value::Null) => column.push(None),
            Some(Value::Number(n)) => {
                seen_value = true;
                column.push(Some(n.as_f64()?));
            }
            Some(_) => return None,
        }
    }

    seen_value.then_some(column)
}

fn impute_mean(column: Vec<Option<f64>>) -> Vec<f64> {
    let present: Vec<f64> = column.iter().flatten().copied().collect();
    let mean = present.iter().sum::<f64>() / present.len() as f64;

    column.into_iter().map(|v| v.unwrap_or(mean)).collect()
}
