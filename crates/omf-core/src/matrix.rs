//! Row-major share-matrix container.

use crate::share::Share;

/// A fixed-dimension matrix of share scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareMatrix {
    cols: usize,
    rows: Vec<Vec<Share>>,
}

impl ShareMatrix {
    /// Builds a matrix from its rows. All rows must have the same width.
    pub fn from_rows(rows: Vec<Vec<Share>>) -> Self {
        let cols = rows.first().map(Vec::len).unwrap_or_default();
        assert!(
            rows.iter().all(|row| row.len() == cols),
            "ragged matrix rows"
        );
        Self { cols, rows }
    }

    /// An all-zero matrix.
    pub fn zero(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            rows: vec![vec![Share::ZERO; cols]; rows],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrows one row.
    pub fn row(&self, index: usize) -> &[Share] {
        &self.rows[index]
    }

    /// Replaces one row.
    pub fn set_row(&mut self, index: usize, row: Vec<Share>) {
        assert_eq!(row.len(), self.cols, "row width mismatch");
        self.rows[index] = row;
    }

    /// Copies one column out as a vector.
    pub fn column(&self, index: usize) -> Vec<Share> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Adds a length-`rows` delta into one column.
    pub fn add_column(&mut self, index: usize, delta: &[Share]) {
        assert_eq!(delta.len(), self.rows.len(), "column height mismatch");
        for (row, &d) in self.rows.iter_mut().zip(delta) {
            row[index] += d;
        }
    }

    /// Iterates over the rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Share]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ShareMatrix {
        ShareMatrix::from_rows(vec![
            vec![Share::new(1), Share::new(2)],
            vec![Share::new(3), Share::new(4)],
            vec![Share::new(5), Share::new(6)],
        ])
    }

    #[test]
    fn column_extraction() {
        let m = sample();
        assert_eq!(
            m.column(1),
            vec![Share::new(2), Share::new(4), Share::new(6)]
        );
    }

    #[test]
    fn column_accumulate() {
        let mut m = sample();
        m.add_column(0, &[Share::new(10), Share::new(20), Share::new(30)]);
        assert_eq!(m.column(0), vec![Share::new(11), Share::new(23), Share::new(35)]);
        assert_eq!(m.column(1), vec![Share::new(2), Share::new(4), Share::new(6)]);
    }

    #[test]
    #[should_panic(expected = "ragged")]
    fn ragged_rows_rejected() {
        ShareMatrix::from_rows(vec![vec![Share::ZERO], vec![Share::ZERO, Share::ONE]]);
    }
}
