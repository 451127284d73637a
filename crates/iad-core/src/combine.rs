//! Combine (C5): the add-two-layers rule and the doubling loop built on
//! top of it.
//!
//! A layer is represented as an asymmetric [`Layer`] (`r01`/`t01` for flux
//! incident from side 0, `r10`/`t10` for flux incident from side 1); a
//! layer produced by [`crate::start`] or [`build_symmetric`] has
//! `r01 == r10` and `t01 == t10` since a freshly-started or freshly-doubled
//! slab looks the same from either face.

use crate::error::Result;
use crate::matrix::Matrix;

/// A reflection/transmission operator pair for one layer, asymmetric in
/// general: flux incident on side 0 sees `(r01, t01)`, flux incident on
/// side 1 sees `(r10, t10)`.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Reflectance for flux entering from side 0.
    pub r01: Matrix,
    /// Transmittance for flux entering from side 0 (0 -> 1).
    pub t01: Matrix,
    /// Reflectance for flux entering from side 1.
    pub r10: Matrix,
    /// Transmittance for flux entering from side 1 (1 -> 0).
    pub t10: Matrix,
}

impl Layer {
    /// Builds a symmetric layer (`r01 == r10`, `t01 == t10`) from a single
    /// `(R, T)` pair, as produced directly by the thin-layer starter.
    #[must_use]
    pub fn symmetric(r: Matrix, t: Matrix) -> Self {
        Self {
            r01: r.clone(),
            t01: t.clone(),
            r10: r,
            t10: t,
        }
    }

    /// A pass-through identity layer: `R = 0`, `T = I`. Used for the
    /// `b = 0` edge case and as the identity element when adding slides
    /// that happen to be index-matched.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let zero = Matrix::zeros(n);
        let id = Matrix::identity(n);
        Self::symmetric(zero, id)
    }

    /// An opaque layer: `R` unchanged, `T = 0`. Used once doubling detects
    /// the thick-slab limit, so further doublings are a no-op.
    #[must_use]
    pub fn opaque(r: Matrix) -> Self {
        let n = r.n();
        Self {
            t01: Matrix::zeros(n),
            t10: Matrix::zeros(n),
            r10: r.clone(),
            r01: r,
        }
    }

    fn n(&self) -> usize {
        self.r01.n()
    }

    /// Largest transmittance entry, used by [`double`] to detect the
    /// thick-slab limit.
    fn max_transmittance(&self) -> f64 {
        self.t01.max_abs().max(self.t10.max_abs())
    }
}

/// Adds two dissimilar layers, `alpha` above `beta`, following the
/// star-product rule:
///
/// ```text
/// A = T_b01 (I - R_a10 R_b01)^-1
/// B = T_a10 (I - R_b01 R_a10)^-1
/// T_ab01 = A T_a01
/// T_ab10 = B T_b10
/// R_ab01 = R_a01 + A R_b01 T_a10
/// R_ab10 = R_b10 + B R_a10 T_b10
/// ```
///
/// The inverse multiplications are each a single linear solve, falling
/// back to a regularized solve if the direct solve reports a singular
/// matrix (spectral radius of `R_a10 R_b01` is `<= 1` for a physical
/// diffuse reflectance, so this should only trip for pathological inputs).
pub fn add_layers(alpha: &Layer, beta: &Layer) -> Result<Layer> {
    let n = alpha.n();
    let id = Matrix::identity(n);

    let lhs_a = id.sub(&alpha.r10.mul(&beta.r01));
    let a = solve_or_regularize(&lhs_a, &beta.t01)?;

    let lhs_b = id.sub(&beta.r01.mul(&alpha.r10));
    let b = solve_or_regularize(&lhs_b, &alpha.t10)?;

    let t01 = a.mul(&alpha.t01);
    let t10 = b.mul(&beta.t10);
    let r01 = alpha.r01.add(&a.mul(&beta.r01).mul(&alpha.t10));
    let r10 = beta.r10.add(&b.mul(&alpha.r10).mul(&beta.t10));

    Ok(Layer { r01, t01, r10, t10 })
}

fn solve_or_regularize(lhs: &Matrix, rhs: &Matrix) -> Result<Matrix> {
    match lhs.solve(rhs) {
        Ok(x) => Ok(x),
        Err(crate::error::IadError::Singular { .. }) => lhs.solve_regularized(rhs, 1e-10),
        Err(e) => Err(e),
    }
}

/// Doubles a symmetric layer `doublings` times, starting from the thin
/// layer produced by [`crate::start::starting_layer`]. Stops early
/// (freezing `T = 0`) once the diffuse transmittance falls below
/// `1e-12`, treating the layer as a thick, fully opaque slab from then on.
pub fn double(starting: Layer, doublings: u32) -> Result<Layer> {
    let mut layer = starting;
    for _ in 0..doublings {
        if layer.max_transmittance() < 1e-12 {
            layer = Layer::opaque(layer.r01);
            break;
        }
        layer = add_layers(&layer, &layer)?;
    }
    Ok(layer)
}

/// Wraps a (possibly asymmetric) slab with boundary layers above and
/// below, producing the full sample-plus-slides stack. When
/// `below` is `None`, `above` is applied to both faces (matching slides).
pub fn add_slides(slab: Layer, above: Layer, below: Option<Layer>) -> Result<Layer> {
    let below = below.unwrap_or_else(|| above.clone());
    let with_top = add_layers(&above, &slab)?;
    add_layers(&with_top, &below)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_layer_is_a_no_op_when_added() {
        let id = Layer::identity(4);
        let mut r = Matrix::zeros(4);
        r.set(0, 0, 0.2);
        let layer = Layer::symmetric(r.clone(), Matrix::identity(4).scale(0.8));

        let combined = add_layers(&id, &layer).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                assert!((combined.r01.get(i, j) - layer.r01.get(i, j)).abs() < 1e-9);
                assert!((combined.t01.get(i, j) - layer.t01.get(i, j)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn doubling_opaque_limit_freezes_transmittance() {
        let n = 3;
        let mut r = Matrix::zeros(n);
        for i in 0..n {
            r.set(i, i, 0.1);
        }
        let t = Matrix::zeros(n); // already opaque
        let starting = Layer::symmetric(r, t);
        let doubled = double(starting, 10).unwrap();
        assert_eq!(doubled.t01.max_abs(), 0.0);
    }

    #[test]
    fn doubling_thin_transparent_layer_grows_transmittance_monotonically_no_greater_than_one() {
        let n = 3;
        let r = Matrix::diagonal(&[0.001, 0.001, 0.001]);
        let t = Matrix::diagonal(&[0.998, 0.998, 0.998]);
        let starting = Layer::symmetric(r, t);
        let doubled = double(starting, 4).unwrap();
        assert!(doubled.t01.max_abs() <= 1.0 + 1e-6);
    }

    #[test]
    fn add_slides_matching_above_and_below_uses_same_boundary() {
        let n = 2;
        let slab = Layer::symmetric(Matrix::zeros(n), Matrix::identity(n));
        let boundary = Layer::symmetric(
            Matrix::diagonal(&[0.05, 0.05]),
            Matrix::diagonal(&[0.95, 0.95]),
        );
        let stacked = add_slides(slab, boundary.clone(), None).unwrap();
        assert!(stacked.r01.max_abs() > 0.0);
    }
}
