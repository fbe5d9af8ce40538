//! Named, fixed-width integer feature matrix

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};

/// Rows of integer features with one name per column
///
/// Indicator columns hold `0` or `1`. Every row has exactly
/// `columns.len()` entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<i64>>,
}

impl FeatureMatrix {
    /// Build a matrix, checking that every row matches the column count
    pub fn new(columns: Vec<String>, rows: Vec<Vec<i64>>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(CoreError::InvalidMatrix(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Zero-filled matrix of the given shape
    pub fn zeros(columns: Vec<String>, n_rows: usize) -> Self {
        let width = columns.len();
        Self {
            columns,
            rows: vec![vec![0; width]; n_rows],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `(row, column name)`
    pub fn get(&self, row: usize, column: &str) -> Option<i64> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).copied()
    }

    /// Names of the columns set to a non-zero value in one row
    pub fn active_columns(&self, row: usize) -> Vec<&str> {
        match self.rows.get(row) {
            Some(values) => self
                .columns
                .iter()
                .zip(values)
                .filter(|(_, &v)| v != 0)
                .map(|(c, _)| c.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Keep only the rows at the given indices, in that order
    ///
    /// Out-of-range indices are skipped.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_shape_check() {
        assert!(FeatureMatrix::new(cols(&["a", "b"]), vec![vec![1, 0], vec![0, 1]]).is_ok());
        assert!(FeatureMatrix::new(cols(&["a", "b"]), vec![vec![1]]).is_err());
    }

    #[test]
    fn test_lookup() {
        let m = FeatureMatrix::new(cols(&["a", "b", "c"]), vec![vec![0, 1, 1]]).unwrap();
        assert_eq!(m.get(0, "b"), Some(1));
        assert_eq!(m.get(0, "z"), None);
        assert_eq!(m.get(3, "a"), None);
        assert_eq!(m.active_columns(0), vec!["b", "c"]);
    }

    #[test]
    fn test_select_rows() {
        let m = FeatureMatrix::new(cols(&["a"]), vec![vec![1], vec![2], vec![3]]).unwrap();
        let s = m.select_rows(&[2, 0]);
        assert_eq!(s.rows, vec![vec![3], vec![1]]);
        assert_eq!(s.columns, m.columns);
        assert_eq!(m.select_rows(&[5, 1]).rows, vec![vec![2]]);
    }

    #[test]
    fn test_ragged_rows_do_not_panic() {
        let m = FeatureMatrix {
            columns: cols(&["a", "b"]),
            rows: vec![vec![1]],
        };
        assert_eq!(m.get(0, "a"), Some(1));
        assert_eq!(m.get(0, "b"), None);
    }
}
