//! Sparse matrix and preconditioned conjugate gradient solver.
//!
//! This module provides a lightweight sparse matrix implementation (CSR format)
//! with the normal-equations product needed by least-squares energies, and a
//! Jacobi-preconditioned conjugate gradient solver for symmetric positive
//! definite systems.

use nalgebra::DVector;

use crate::error::{Result, UnwrapError};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in CSR format for efficient matrix-vector multiplication.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Row pointers: row_ptr[i] is the index in col_idx/values where row i starts.
    /// Length is rows + 1, with row_ptr[rows] = nnz.
    row_ptr: Vec<usize>,
    /// Column indices for each non-zero value.
    col_idx: Vec<usize>,
    /// Non-zero values.
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        // Sort by (row, col) for CSR construction
        triplets.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            debug_assert!(row < rows && col < cols, "triplet out of bounds");
            if last == Some((row, col)) {
                // Same position: accumulate value
                if let Some(acc) = values.last_mut() {
                    *acc += val;
                }
            } else {
                col_idx.push(col);
                values.push(val);
                row_ptr[row + 1] += 1;
                last = Some((row, col));
            }
        }

        // Per-row counts to offsets
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over the stored entries of one row as (col, value).
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Iterate over all stored entries as (row, col, value), row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |i| self.row(i).map(move |(j, v)| (i, j, v)))
    }

    /// The main diagonal, zero where no entry is stored.
    pub fn diagonal(&self) -> DVector<f64> {
        let n = self.rows.min(self.cols);
        let mut d = DVector::zeros(n);
        for i in 0..n {
            d[i] = self
                .row(i)
                .filter(|&(j, _)| j == i)
                .map(|(_, v)| v)
                .sum();
        }
        d
    }

    /// Compute the normal-equations matrix `AᵀA`.
    ///
    /// Each row of `A` contributes the outer product of its entries, so the
    /// cost is the sum of squared row lengths.
    pub fn gram(&self) -> CsrMatrix {
        let capacity: usize = (0..self.rows)
            .map(|i| {
                let len = self.row_ptr[i + 1] - self.row_ptr[i];
                len * len
            })
            .sum();
        let mut triplets = Vec::with_capacity(capacity);

        for i in 0..self.rows {
            for (j, vj) in self.row(i) {
                for (k, vk) in self.row(i) {
                    triplets.push((j, k, vj * vk));
                }
            }
        }

        CsrMatrix::from_triplets(self.cols, self.cols, triplets)
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.rows);

        for i in 0..self.rows {
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];

            let mut sum = 0.0;
            for k in start..end {
                sum += self.values[k] * x[self.col_idx[k]];
            }
            y[i] = sum;
        }

        y
    }
}

/// Solve A*x = b using the Jacobi-preconditioned Conjugate Gradient method.
///
/// Requires A to be symmetric positive definite.
///
/// # Arguments
///
/// * `a` - The system matrix (must be symmetric positive definite)
/// * `b` - The right-hand side vector
/// * `x0` - Optional initial guess (zeros if None)
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance (relative residual norm)
///
/// # Errors
///
/// - [`UnwrapError::SolverBreakdown`] if a search direction has non-positive
///   curvature or the diagonal has a negative entry (A is not SPD)
/// - [`UnwrapError::ConvergenceFailed`] if `max_iter` is reached
/// - [`UnwrapError::NonFiniteSolution`] if the iterate becomes NaN or infinite
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: Option<&DVector<f64>>,
    max_iter: usize,
    tolerance: f64,
) -> Result<DVector<f64>> {
    let n = b.len();
    assert_eq!(a.nrows(), n, "Matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), n, "Matrix must be square");

    // Initial guess
    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => DVector::zeros(n),
    };

    let b_norm = b.norm();
    if !b_norm.is_finite() {
        return Err(UnwrapError::NonFiniteSolution);
    }
    if b_norm < 1e-15 {
        return Ok(DVector::zeros(n));
    }

    // Jacobi preconditioner; empty rows keep a unit weight
    let mut inv_diag = a.diagonal();
    for d in inv_diag.iter_mut() {
        if *d < 0.0 {
            return Err(UnwrapError::SolverBreakdown { iteration: 0 });
        }
        *d = if *d > 0.0 { 1.0 / *d } else { 1.0 };
    }

    // r = b - A*x
    let mut r = b - a.mul_vec(&x);
    if r.norm() / b_norm < tolerance {
        return Ok(x);
    }

    let mut z = r.component_mul(&inv_diag);
    let mut rz = r.dot(&z);
    let mut p = z.clone();

    for iter in 0..max_iter {
        let ap = a.mul_vec(&p);

        // alpha = (r · z) / (p · Ap)
        let p_ap = p.dot(&ap);
        if p_ap.is_nan() || p_ap <= 0.0 {
            log::debug!("CG breakdown at iteration {}: p·Ap = {:e}", iter, p_ap);
            return Err(UnwrapError::SolverBreakdown { iteration: iter });
        }
        let alpha = rz / p_ap;

        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        let rel = r.norm() / b_norm;
        if !rel.is_finite() {
            return Err(UnwrapError::NonFiniteSolution);
        }
        if rel < tolerance {
            log::trace!("CG converged after {} iterations", iter + 1);
            return Ok(x);
        }

        z = r.component_mul(&inv_diag);
        let rz_new = r.dot(&z);
        let beta = rz_new / rz;

        // p = z + beta * p
        p.axpy(1.0, &z, beta);
        rz = rz_new;
    }

    Err(UnwrapError::ConvergenceFailed {
        iterations: max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spd_2x2() -> CsrMatrix {
        // [ 4  1 ]
        // [ 1  3 ]
        CsrMatrix::from_triplets(2, 2, vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)])
    }

    #[test]
    fn test_csr_from_triplets() {
        let a = spd_2x2();
        assert_eq!(a.nrows(), 2);
        assert_eq!(a.ncols(), 2);
        assert_eq!(a.nnz(), 4);
        assert_eq!(
            a.iter().collect::<Vec<_>>(),
            vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)]
        );
    }

    #[test]
    fn test_csr_from_triplets_with_duplicates() {
        // Same matrix but with duplicate entries that should be summed
        let triplets = vec![
            (1, 1, 3.0),
            (0, 0, 2.0),
            (0, 1, 1.0),
            (0, 0, 2.0), // Duplicate: should sum to 4.0
            (1, 0, 1.0),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);

        let x = DVector::from_vec(vec![1.0, 0.0]);
        let y = a.mul_vec(&x);

        assert_eq!(a.nnz(), 4);
        assert!((y[0] - 4.0).abs() < 1e-10);
        assert!((y[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_csr_empty_rows() {
        let a = CsrMatrix::from_triplets(4, 4, vec![(2, 1, 5.0)]);
        assert_eq!(a.row(0).count(), 0);
        assert_eq!(a.row(2).collect::<Vec<_>>(), vec![(1, 5.0)]);
        assert_eq!(a.row(3).count(), 0);
        assert_eq!(a.diagonal(), DVector::zeros(4));
    }

    #[test]
    fn test_csr_mul_vec() {
        // [ 4  1 ]   [ 1 ]   [ 5 ]
        // [ 1  3 ] * [ 1 ] = [ 4 ]
        let a = spd_2x2();

        let x = DVector::from_vec(vec![1.0, 1.0]);
        let y = a.mul_vec(&x);

        assert!((y[0] - 5.0).abs() < 1e-10);
        assert!((y[1] - 4.0).abs() < 1e-10);
        assert_eq!(a.diagonal(), DVector::from_vec(vec![4.0, 3.0]));
    }

    #[test]
    fn test_gram_matches_dense_product() {
        // A = [ 1 2 0 ]
        //     [ 0 1 3 ]
        let a = CsrMatrix::from_triplets(
            2,
            3,
            vec![(0, 0, 1.0), (0, 1, 2.0), (1, 1, 1.0), (1, 2, 3.0)],
        );
        let ata = a.gram();
        assert_eq!(ata.nrows(), 3);
        assert_eq!(ata.ncols(), 3);

        let expected = [[1.0, 2.0, 0.0], [2.0, 5.0, 3.0], [0.0, 3.0, 9.0]];
        for (i, row) in expected.iter().enumerate() {
            let mut e = DVector::zeros(3);
            e[i] = 1.0;
            let col = ata.mul_vec(&e);
            for (j, &value) in row.iter().enumerate() {
                assert!((col[j] - value).abs() < 1e-12, "entry ({}, {})", j, i);
            }
        }
    }

    #[test]
    fn test_cg_simple() {
        // Solve:
        // [ 4  1 ]   [ x ]   [ 1 ]
        // [ 1  3 ] * [ y ] = [ 2 ]
        //
        // Solution: x = 1/11, y = 7/11
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);

        let x = conjugate_gradient(&a, &b, None, 100, 1e-10).unwrap();

        // Verify A*x = b
        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-8);

        // Check solution values
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-8);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-8);
    }

    #[test]
    fn test_cg_larger_system() {
        // 4x4 symmetric positive definite matrix (diagonally dominant)
        let triplets = vec![
            (0, 0, 10.0),
            (0, 1, 1.0),
            (0, 2, 2.0),
            (1, 0, 1.0),
            (1, 1, 10.0),
            (1, 2, 1.0),
            (2, 0, 2.0),
            (2, 1, 1.0),
            (2, 2, 10.0),
            (2, 3, 1.0),
            (3, 2, 1.0),
            (3, 3, 10.0),
        ];
        let a = CsrMatrix::from_triplets(4, 4, triplets);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);

        let x = conjugate_gradient(&a, &b, None, 100, 1e-10).unwrap();

        // Verify A*x = b
        let residual = a.mul_vec(&x) - &b;
        assert!(residual.norm() < 1e-8);
    }

    #[test]
    fn test_cg_with_initial_guess() {
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);

        // Start with a good initial guess
        let x0 = DVector::from_vec(vec![0.1, 0.6]);
        let x = conjugate_gradient(&a, &b, Some(&x0), 100, 1e-10).unwrap();

        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-8);
    }

    #[test]
    fn test_cg_zero_rhs() {
        let x = conjugate_gradient(&spd_2x2(), &DVector::zeros(2), None, 10, 1e-10).unwrap();
        assert_eq!(x, DVector::zeros(2));
    }

    #[test]
    fn test_cg_detects_indefinite_matrix() {
        // Eigenvalues 3 and -1; b is the eigenvector of -1
        let a = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 1.0), (0, 1, 2.0), (1, 0, 2.0), (1, 1, 1.0)],
        );
        let b = DVector::from_vec(vec![1.0, -1.0]);

        match conjugate_gradient(&a, &b, None, 100, 1e-10) {
            Err(UnwrapError::SolverBreakdown { iteration: 0 }) => (),
            other => panic!("expected breakdown, got {:?}", other),
        }
    }

    #[test]
    fn test_cg_detects_singular_matrix() {
        // Second unknown is unconstrained but the rhs asks for it
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1.0)]);
        let b = DVector::from_vec(vec![1.0, 1.0]);

        assert!(matches!(
            conjugate_gradient(&a, &b, None, 100, 1e-10),
            Err(UnwrapError::SolverBreakdown { .. })
        ));
    }

    #[test]
    fn test_cg_reports_iteration_limit() {
        let a = CsrMatrix::from_triplets(
            3,
            3,
            vec![
                (0, 0, 4.0),
                (0, 1, 1.0),
                (1, 0, 1.0),
                (1, 1, 3.0),
                (1, 2, 1.0),
                (2, 1, 1.0),
                (2, 2, 2.0),
            ],
        );
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);

        match conjugate_gradient(&a, &b, None, 1, 1e-14) {
            Err(UnwrapError::ConvergenceFailed { iterations: 1 }) => (),
            other => panic!("expected ConvergenceFailed, got {:?}", other),
        }
    }
}
