//! Boundary matrices (C6): the glass-slide / bare-interface layer that sits
//! above and below the scattering slab itself.
//!
//! When the sample and its surrounding medium share a refractive index,
//! the boundary is the identity layer (no reflectance, full
//! transmittance). Otherwise each quadrature direction `nu_j` picks up a
//! reflectance from the sample, through the slide, out to air — the full
//! air-glass-slab specular stack of [`crate::fresnel::specular_rt`], not a
//! single bare interface — and the transmitted flux is remapped from the
//! interior cosine `nu_j` to the Snell-refracted exterior cosine (which
//! depends only on the sample and air indices; the slide's own index
//! bends the ray twice, cancelling out), linearly redistributed across
//! the bracketing quadrature nodes ("snell remapping") so the boundary's
//! outgoing flux stays on the same quadrature grid the rest of the engine
//! uses.

use crate::combine::Layer;
use crate::fresnel::{cos_snell, specular_rt};
use crate::math::constants::AIR_INDEX;
use crate::math::inverse_lerp;
use crate::matrix::Matrix;
use crate::quadrature::QuadratureSet;

/// Builds the boundary [`Layer`] between the sample (`n_sample`) and the
/// outside world through a slide of index `n_slide`, on the quadrature
/// `quad` (shared by both sides, since a boundary layer doesn't change
/// the number of streams). The slide is assumed lossless (`b_slab = 0`,
/// since [`crate::sample::Sample`] carries no slide-thickness field) but
/// its own reflections at the slide/air face are still summed, via
/// [`crate::fresnel::specular_rt`]'s geometric series, rather than
/// ignored; `n_slide == AIR_INDEX` collapses the stack back to a single
/// bare sample/air interface.
///
/// `r01`/`t01` describe flux leaving the sample through this boundary
/// (inside -> outside); `r10`/`t10` describe flux entering from outside.
/// For the index-matched case both reduce to the identity.
#[must_use]
pub fn build_boundary(quad: &QuadratureSet, n_sample: f64, n_slide: f64) -> Layer {
    if (n_sample - n_slide).abs() < crate::math::constants::EPSILON {
        return Layer::identity(quad.n);
    }

    let (r01, t01) = boundary_direction(quad, n_sample, n_slide, AIR_INDEX);
    let (r10, t10) = boundary_direction(quad, AIR_INDEX, n_slide, n_sample);

    Layer { r01, t01, r10, t10 }
}

/// Builds the one-directional `(R, T)` pair for flux crossing from a
/// medium of index `n_near` through a slide of index `n_slide` into a
/// medium of index `n_far`, at the quadrature cosines taken to lie in
/// `n_near`. The reflectance matrix is diagonal (each direction reflects
/// back into itself); the transmittance matrix carries the Snell
/// remapping to `n_far` and is diagonal only when every refracted cosine
/// happens to land exactly on a quadrature node.
fn boundary_direction(quad: &QuadratureSet, n_near: f64, n_slide: f64, n_far: f64) -> (Matrix, Matrix) {
    let n = quad.n;
    let mut r = Matrix::zeros(n);
    let mut t = Matrix::zeros(n);

    for j in 0..n {
        let nu_j = quad.nu[j];
        let (reflectance, transmitted) = specular_rt(n_near, n_slide, n_far, 0.0, nu_j);
        r.set(j, j, reflectance);

        if transmitted <= 0.0 {
            continue;
        }

        match cos_snell(n_near, n_far, nu_j) {
            None => {
                // Total internal reflection already folded into
                // `reflectance == 1.0`; nothing to transmit.
            }
            Some(nu_refracted) => {
                distribute_onto_grid(&mut t, j, nu_refracted, transmitted, &quad.nu);
            }
        }
    }

    (r, t)
}

/// Spreads `flux` transmitted from source direction `j` at refracted
/// cosine `nu_refracted` onto the bracketing pair of grid nodes in `nu`,
/// linearly weighted by how close `nu_refracted` sits to each. Falls
/// outside `[nu[0], nu[n-1]]` clamp to the nearest edge node.
fn distribute_onto_grid(t: &mut Matrix, j: usize, nu_refracted: f64, flux: f64, nu: &[f64]) {
    let n = nu.len();

    if nu_refracted <= nu[0] {
        t.add_at(0, j, flux);
        return;
    }
    if nu_refracted >= nu[n - 1] {
        t.add_at(n - 1, j, flux);
        return;
    }

    let upper = nu.partition_point(|&x| x < nu_refracted);
    let lower = upper - 1;
    let frac = inverse_lerp(nu[lower], nu[upper], nu_refracted);

    t.add_at(lower, j, flux * (1.0 - frac));
    t.add_at(upper, j, flux * frac);
}
