//! Thin-layer starting matrices (C4): pick a thin enough slab that the
//! layer's reflection and transmission can be linearized in its thickness,
//! then hand the doubling loop in [`crate::combine`] a `(K, R, T)` triple
//! to double up from.
//!
//! Two initializers are available:
//!
//! - [`Starter::Igi`] ("infinitesimal generator"): a first-order expansion
//!   of the radiative transfer equation in the starting thickness.
//! - [`Starter::Diamond`]: solves a small linear system instead of using
//!   the raw first-order expansion, which stays stable when the smallest
//!   quadrature cosine is tiny relative to the starting thickness (where
//!   IGI's `1/nu` term would otherwise dominate the expansion).
//!
//! [`starting_layer`] implements the `AUTO` selection: pick the thinnest
//! `d_start = b* * 2^-K` that still respects `d_start <= min(nu) / 2`, then
//! use Diamond whenever that bound is the binding constraint (i.e.
//! `min(nu)` is small), IGI otherwise.

use crate::error::{IadError, Result};
use crate::matrix::Matrix;
use crate::quadrature::QuadratureSet;
use crate::redistribution::RedistributionMatrices;

/// Which thin-layer initializer to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Starter {
    /// Infinitesimal-generator first-order expansion.
    Igi,
    /// Linear-system (diamond) initializer, stable for small `min(nu)`.
    Diamond,
    /// Let [`starting_layer`] choose based on `min(nu)` vs. `d_start`.
    Auto,
}

/// A thin starting layer: its thickness, the number of doublings `K`
/// needed to reach the sample's full optical thickness, and its `(R, T)`
/// matrix pair.
#[derive(Debug, Clone)]
pub struct StartingLayer {
    /// Thickness of the starting slab, `b* * 2^-doublings`.
    pub thickness: f64,
    /// Number of doubling iterations required to reach `b*`.
    pub doublings: u32,
    /// Reflection matrix of the starting slab.
    pub r: Matrix,
    /// Transmission matrix of the starting slab.
    pub t: Matrix,
}

/// `W = diag(2 * nu * w)`, the flux-weighting diagonal the IGI and Diamond
/// formulas both use to turn a redistribution matrix into an operator on
/// flux rather than radiance.
fn flux_weight(quad: &QuadratureSet) -> Matrix {
    Matrix::diagonal(&quad.twonuw)
}

/// Builds the `(R, T)` pair for a starting slab of thickness `d_start`
/// under the infinitesimal-generator expansion:
///
/// `R = a * h+- * W * d_start`
/// `T = I - d_start * (diag(1/nu) - a * h++ * W)`
fn igi_start(quad: &QuadratureSet, rd: &RedistributionMatrices, a_star: f64, d_start: f64) -> (Matrix, Matrix) {
    let n = quad.n;
    let w = flux_weight(quad);

    let r = rd.h_pm.mul(&w).scale(a_star * d_start);

    let inv_nu: Vec<f64> = quad.nu.iter().map(|&nu| 1.0 / nu).collect();
    let diag_inv_nu = Matrix::diagonal(&inv_nu);
    let a_hpp_w = rd.h_pp.mul(&w).scale(a_star);
    let bracket = diag_inv_nu.sub(&a_hpp_w);
    let t = Matrix::identity(n).sub(&bracket.scale(d_start));

    (r, t)
}

/// Builds the `(R, T)` pair for a starting slab of thickness `d_start`
/// under the Diamond initializer: solves `(I + d_start * A) * T = I` for
/// `T` directly (rather than using IGI's first-order `T` expansion), then
/// derives `R` from `T`.
///
/// `A = diag(1/nu) - a * h++ * W`
fn diamond_start(
    quad: &QuadratureSet,
    rd: &RedistributionMatrices,
    a_star: f64,
    d_start: f64,
) -> Result<(Matrix, Matrix)> {
    let n = quad.n;
    let w = flux_weight(quad);

    let inv_nu: Vec<f64> = quad.nu.iter().map(|&nu| 1.0 / nu).collect();
    let diag_inv_nu = Matrix::diagonal(&inv_nu);
    let a_hpp_w = rd.h_pp.mul(&w).scale(a_star);
    let big_a = diag_inv_nu.sub(&a_hpp_w);

    let lhs = Matrix::identity(n).add(&big_a.scale(d_start));
    let rhs = Matrix::identity(n);
    let t = match lhs.solve(&rhs) {
        Ok(t) => t,
        Err(IadError::Singular { .. }) => lhs.solve_regularized(&rhs, 1e-10)?,
        Err(e) => return Err(e),
    };

    let r = rd.h_pm.mul(&w).mul(&t).scale(a_star * d_start);

    Ok((r, t))
}

/// Picks the thinnest starting thickness `d_start = b* * 2^-K` subject to
/// `d_start <= min(nu) / 2`, and builds its `(R, T)` pair with the
/// initializer named by `starter` (or the automatic choice when `starter`
/// is [`Starter::Auto`]).
///
/// `b_star` is the delta-M-transformed optical thickness of the full
/// sample (see [`crate::redistribution::delta_m_transform`]); `a_star` is
/// its transformed albedo.
pub fn starting_layer(
    quad: &QuadratureSet,
    rd: &RedistributionMatrices,
    a_star: f64,
    b_star: f64,
    starter: Starter,
) -> Result<StartingLayer> {
    if b_star <= 0.0 {
        return Err(IadError::ParamOutOfRange {
            param: "b*",
            value: b_star.to_string(),
            expected: "> 0",
        });
    }

    let min_nu = quad.nu.iter().cloned().fold(f64::INFINITY, f64::min);
    let bound = min_nu / 2.0;

    let mut doublings = 0_u32;
    let mut d_start = b_star;
    while d_start > bound && doublings < 64 {
        d_start *= 0.5;
        doublings += 1;
    }

    let use_diamond = match starter {
        Starter::Igi => false,
        Starter::Diamond => true,
        // min(nu) small relative to the starting thickness means 1/nu in
        // the IGI bracket is large enough that its first-order expansion
        // of T starts losing accuracy; Diamond's implicit solve is stable
        // there.
        Starter::Auto => min_nu < 4.0 * d_start,
    };

    let (r, t) = if use_diamond {
        diamond_start(quad, rd, a_star, d_start)?
    } else {
        igi_start(quad, rd, a_star, d_start)
    };

    Ok(StartingLayer {
        thickness: d_start,
        doublings,
        r,
        t,
    })
}
