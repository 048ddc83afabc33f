//! Column-major matrix type for signature banks and Gram matrices.
//!
//! [`SigMatrix`] carries its dimensions alongside a flat `Vec<f64>`. Rows are
//! paths, columns are signature coefficients (or, for a Gram matrix, the paths
//! of the second bank). Because storage is column-major, a contiguous block of
//! columns, such as one signature level, is a contiguous slice of the data.

use nalgebra::DMatrix;

/// Column-major dense matrix.
///
/// Element `(row, col)` lives at index `row + col * nrows`.
///
/// # Examples
///
/// ```
/// use sigmmd::matrix::SigMatrix;
///
/// // 2 paths, 3 signature coefficients
/// let data = vec![
///     1.0, 2.0, // coefficient 0
///     3.0, 4.0, // coefficient 1
///     5.0, 6.0, // coefficient 2
/// ];
/// let sigs = SigMatrix::from_column_major(data, 2, 3).unwrap();
///
/// assert_eq!(sigs[(1, 2)], 6.0);
/// assert_eq!(sigs.column(1), &[3.0, 4.0]);
/// assert_eq!(sigs.row(0), vec![1.0, 3.0, 5.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SigMatrix {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
    /// Set only for the depth-0 signature bank, whose single column is the
    /// implicit level-0 term rather than a level-1 coefficient.
    level_zero: bool,
}

impl SigMatrix {
    /// Create from flat column-major data with dimension validation.
    ///
    /// Returns `None` if `data.len() != nrows * ncols`.
    pub fn from_column_major(data: Vec<f64>, nrows: usize, ncols: usize) -> Option<Self> {
        if data.len() != nrows * ncols {
            return None;
        }
        Some(Self {
            data,
            nrows,
            ncols,
            level_zero: false,
        })
    }

    /// Create a zero-filled matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
            level_zero: false,
        }
    }

    /// The depth-0 signature bank: an `N x 1` column of ones.
    ///
    /// Unlike a level-1 bank of the same shape, it holds no level `>= 1`
    /// coefficients, see [`is_level_zero`](Self::is_level_zero).
    pub fn level_zero(nrows: usize) -> Self {
        Self {
            data: vec![1.0; nrows],
            nrows,
            ncols: 1,
            level_zero: true,
        }
    }

    /// Whether this bank is the depth-0 signature built by [`level_zero`](Self::level_zero).
    #[inline]
    pub fn is_level_zero(&self) -> bool {
        self.level_zero
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Dimensions as `(nrows, ncols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the matrix is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a contiguous column slice (zero-copy).
    ///
    /// # Panics
    /// Panics if `col >= ncols`.
    #[inline]
    pub fn column(&self, col: usize) -> &[f64] {
        let start = col * self.nrows;
        &self.data[start..start + self.nrows]
    }

    /// Extract a single row as a new `Vec<f64>`.
    ///
    /// O(ncols), rows are strided in column-major layout.
    pub fn row(&self, row: usize) -> Vec<f64> {
        (0..self.ncols)
            .map(|j| self.data[row + j * self.nrows])
            .collect()
    }

    /// Copy the columns `start..end` into a new matrix.
    ///
    /// Returns `None` if the range is out of bounds or reversed.
    pub fn column_range(&self, start: usize, end: usize) -> Option<Self> {
        if start > end || end > self.ncols {
            return None;
        }
        Some(Self {
            data: self.data[start * self.nrows..end * self.nrows].to_vec(),
            nrows: self.nrows,
            ncols: end - start,
            level_zero: self.level_zero,
        })
    }

    /// Flat slice of the underlying column-major data (zero-copy).
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Convert to a nalgebra `DMatrix<f64>` (both are column-major).
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.nrows, self.ncols, &self.data)
    }

    /// Create from a nalgebra `DMatrix<f64>`.
    pub fn from_dmatrix(mat: &DMatrix<f64>) -> Self {
        let (nrows, ncols) = mat.shape();
        Self {
            data: mat.as_slice().to_vec(),
            nrows,
            ncols,
            level_zero: false,
        }
    }

    /// Row-wise inner products `self · otherᵀ`.
    ///
    /// Entry `(i, j)` is the dot product of row `i` of `self` with row `j`
    /// of `other`. Returns `None` if the column counts differ.
    pub fn gram(&self, other: &SigMatrix) -> Option<SigMatrix> {
        if self.ncols != other.ncols {
            return None;
        }
        let product = self.to_dmatrix() * other.to_dmatrix().transpose();
        Some(Self::from_dmatrix(&product))
    }

    /// Mean of each column, i.e. the empirical mean of each coefficient.
    pub fn column_means(&self) -> Vec<f64> {
        if self.nrows == 0 {
            return vec![0.0; self.ncols];
        }
        (0..self.ncols)
            .map(|j| self.column(j).iter().sum::<f64>() / self.nrows as f64)
            .collect()
    }

    /// Sum of all entries.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Set the main diagonal to zero in place.
    pub fn zero_diagonal(&mut self) {
        for i in 0..self.nrows.min(self.ncols) {
            self.data[i + i * self.nrows] = 0.0;
        }
    }
}

impl std::ops::Index<(usize, usize)> for SigMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        debug_assert!(
            row < self.nrows && col < self.ncols,
            "SigMatrix index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        &self.data[row + col * self.nrows]
    }
}

impl std::fmt::Display for SigMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigMatrix({}x{})", self.nrows, self.ncols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_2x3() -> SigMatrix {
        // rows: [1, 3, 5], [2, 4, 6]
        SigMatrix::from_column_major(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap()
    }

    #[test]
    fn test_from_column_major_invalid() {
        assert!(SigMatrix::from_column_major(vec![1.0, 2.0], 3, 4).is_none());
    }

    #[test]
    fn test_rows_of_column_major_data() {
        let mat = sample_2x3();
        assert_eq!(mat.row(0), vec![1.0, 3.0, 5.0]);
        assert_eq!(mat.row(1), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_column_range_is_contiguous_block() {
        let mat = sample_2x3();
        let block = mat.column_range(1, 3).unwrap();
        assert_eq!(block.shape(), (2, 2));
        assert_eq!(block.as_slice(), &[3.0, 4.0, 5.0, 6.0]);
        assert!(mat.column_range(2, 4).is_none());
        assert!(mat.column_range(2, 1).is_none());
        assert_eq!(mat.column_range(1, 1).unwrap().ncols(), 0);
    }

    #[test]
    fn test_gram_entries_are_row_dot_products() {
        let mat = sample_2x3();
        let g = mat.gram(&mat).unwrap();
        assert_eq!(g.shape(), (2, 2));
        // [1,3,5]·[1,3,5] = 35, [1,3,5]·[2,4,6] = 44, [2,4,6]·[2,4,6] = 56
        assert_eq!(g[(0, 0)], 35.0);
        assert_eq!(g[(0, 1)], 44.0);
        assert_eq!(g[(1, 0)], 44.0);
        assert_eq!(g[(1, 1)], 56.0);
    }

    #[test]
    fn test_gram_rectangular_and_mismatch() {
        let a = sample_2x3();
        let b = SigMatrix::from_column_major(vec![1.0, 0.0, 0.0], 1, 3).unwrap();
        let g = a.gram(&b).unwrap();
        assert_eq!(g.shape(), (2, 1));
        assert_eq!(g.column(0), &[1.0, 2.0]);
        assert!(a.gram(&SigMatrix::zeros(1, 2)).is_none());
    }

    #[test]
    fn test_zero_diagonal() {
        // rows: [1, 2], [3, 4]
        let mut g = SigMatrix::from_column_major(vec![1.0, 3.0, 2.0, 4.0], 2, 2).unwrap();
        assert_eq!(g.sum(), 10.0);
        g.zero_diagonal();
        assert_eq!(g.as_slice(), &[0.0, 3.0, 2.0, 0.0]);
        assert_eq!(g.sum(), 5.0);
    }

    #[test]
    fn test_column_means() {
        let mat = sample_2x3();
        assert_eq!(mat.column_means(), vec![1.5, 3.5, 5.5]);
        assert_eq!(SigMatrix::zeros(0, 2).column_means(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_level_zero_is_tagged_ones() {
        let mat = SigMatrix::level_zero(3);
        assert_eq!(mat.shape(), (3, 1));
        assert_eq!(mat.column(0), &[1.0, 1.0, 1.0]);
        assert!(mat.is_level_zero());

        let plain = SigMatrix::from_column_major(vec![1.0; 3], 3, 1).unwrap();
        assert!(!plain.is_level_zero());
        assert_ne!(mat, plain);
        assert!(mat.column_range(0, 1).unwrap().is_level_zero());
    }

    #[test]
    fn test_nalgebra_roundtrip() {
        let mat = sample_2x3();
        let back = SigMatrix::from_dmatrix(&mat.to_dmatrix());
        assert_eq!(mat, back);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", sample_2x3()), "SigMatrix(2x3)");
    }
}
