//! Dense `N x N` matrix type used for the layer reflection/transmission
//! operators and the redistribution matrices.
//!
//! Row-major storage over a flat `Vec<f64>`. `N` is small in practice
//! (4-32), so a flat buffer with LU-based solves is simpler and faster
//! than pulling in a general-purpose linear algebra crate, and it keeps
//! every scratch buffer in the O(N^2) budget called out in the design
//! notes.

use crate::error::IadError;

/// A dense, owned, row-major square matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    n: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates an `n x n` matrix of zeros.
    #[must_use]
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Creates the `n x n` identity matrix.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    /// Builds a diagonal matrix from `diag`.
    #[must_use]
    pub fn diagonal(diag: &[f64]) -> Self {
        let n = diag.len();
        let mut m = Self::zeros(n);
        for (i, &d) in diag.iter().enumerate() {
            m.set(i, i, d);
        }
        m
    }

    /// Matrix dimension (`n` for an `n x n` matrix).
    #[inline]
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
    }

    #[inline]
    pub fn add_at(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] += value;
    }

    /// Raw row-major backing storage.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// `self + other`, element-wise.
    #[must_use]
    pub fn add(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.n, other.n);
        let data = self.data.iter().zip(&other.data).map(|(a, b)| a + b).collect();
        Matrix { n: self.n, data }
    }

    /// `self - other`, element-wise.
    #[must_use]
    pub fn sub(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.n, other.n);
        let data = self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect();
        Matrix { n: self.n, data }
    }

    /// Scales every element by `s`.
    #[must_use]
    pub fn scale(&self, s: f64) -> Matrix {
        Matrix {
            n: self.n,
            data: self.data.iter().map(|v| v * s).collect(),
        }
    }

    /// Standard `O(n^3)` matrix product `self * other`.
    #[must_use]
    pub fn mul(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.n, other.n);
        let n = self.n;
        let mut out = Matrix::zeros(n);
        for i in 0..n {
            for k in 0..n {
                let a_ik = self.get(i, k);
                if a_ik == 0.0 {
                    continue;
                }
                for j in 0..n {
                    out.add_at(i, j, a_ik * other.get(k, j));
                }
            }
        }
        out
    }

    /// Largest absolute element, used for convergence checks (e.g.
    /// "has the doubling loop's transmittance decayed below 1e-12").
    #[must_use]
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Solves `self * X = rhs` for `X`, via Gaussian elimination with
    /// partial pivoting. `rhs` and the returned matrix share `self`'s
    /// dimension; this is the "solve instead of invert" idiom the adding
    /// step relies on for `(I - R_a10 R_b01)^-1 * T_a01` and friends.
    pub fn solve(&self, rhs: &Matrix) -> Result<Matrix, IadError> {
        debug_assert_eq!(self.n, rhs.n);
        let n = self.n;

        // Augmented working copy: n rows, 2n columns (A | B).
        let mut aug = vec![0.0_f64; n * 2 * n];
        for i in 0..n {
            for j in 0..n {
                aug[i * 2 * n + j] = self.get(i, j);
                aug[i * 2 * n + n + j] = rhs.get(i, j);
            }
        }

        for col in 0..n {
            // Partial pivot.
            let mut pivot_row = col;
            let mut pivot_val = aug[col * 2 * n + col].abs();
            for row in (col + 1)..n {
                let v = aug[row * 2 * n + col].abs();
                if v > pivot_val {
                    pivot_val = v;
                    pivot_row = row;
                }
            }

            if pivot_val < 1e-14 {
                return Err(IadError::Singular {
                    detail: format!("pivot |{col}| = {pivot_val:.3e} during layer-add solve"),
                });
            }

            if pivot_row != col {
                for k in 0..(2 * n) {
                    aug.swap(col * 2 * n + k, pivot_row * 2 * n + k);
                }
            }

            let pivot = aug[col * 2 * n + col];
            for k in 0..(2 * n) {
                aug[col * 2 * n + k] /= pivot;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = aug[row * 2 * n + col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..(2 * n) {
                    aug[row * 2 * n + k] -= factor * aug[col * 2 * n + k];
                }
            }
        }

        let mut out = Matrix::zeros(n);
        for i in 0..n {
            for j in 0..n {
                out.set(i, j, aug[i * 2 * n + n + j]);
            }
        }
        Ok(out)
    }

    /// Solves `self * X = rhs` with Tikhonov regularization (`self^T self +
    /// lambda I`), used as the recovery path in [`Self::solve`]'s caller
    /// when a direct solve reports [`IadError::Singular`].
    pub fn solve_regularized(&self, rhs: &Matrix, lambda: f64) -> Result<Matrix, IadError> {
        let n = self.n;
        let mut regularized = self.clone();
        for i in 0..n {
            regularized.add_at(i, i, lambda);
        }
        regularized.solve(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_multiplicative_unit() {
        let mut m = Matrix::zeros(3);
        for i in 0..3 {
            for j in 0..3 {
                m.set(i, j, (i * 3 + j) as f64);
            }
        }
        let id = Matrix::identity(3);
        let product = m.mul(&id);
        assert_eq!(product, m);
    }

    #[test]
    fn solve_recovers_identity_rhs() {
        let mut a = Matrix::zeros(2);
        a.set(0, 0, 4.0);
        a.set(0, 1, 3.0);
        a.set(1, 0, 6.0);
        a.set(1, 1, 3.0);

        let id = Matrix::identity(2);
        let inv = a.solve(&id).unwrap();
        let should_be_identity = a.mul(&inv);

        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((should_be_identity.get(i, j) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn singular_matrix_is_reported() {
        let mut a = Matrix::zeros(2);
        a.set(0, 0, 1.0);
        a.set(0, 1, 2.0);
        a.set(1, 0, 2.0);
        a.set(1, 1, 4.0); // row 1 = 2 * row 0
        let rhs = Matrix::identity(2);
        assert!(matches!(a.solve(&rhs), Err(IadError::Singular { .. })));
    }
}
