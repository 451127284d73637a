//! Fresnel boundary physics: unpolarized reflectance at a dielectric
//! interface, critical-angle bookkeeping for total internal reflection, and
//! the specular/absorbing-glass reflectance-transmittance pairs the
//! boundary matrices in [`crate::boundary`] are built from.
//!
//! The reflectance formula below is the unpolarized average of the s- and
//! p-polarization Fresnel equations; this module has no dependence on
//! wavelength beyond whatever index of refraction the caller supplies.

use crate::math::constants::EPSILON;

/// Cosine of Snell's refraction angle for a ray crossing from a medium of
/// index `n_from` into one of index `n_to`, given the incident cosine
/// `cos_i` in the first medium.
///
/// Returns `None` for total internal reflection (`sin^2(theta_t) > 1`).
#[must_use]
pub fn cos_snell(n_from: f64, n_to: f64, cos_i: f64) -> Option<f64> {
    let sin_i_sq = (1.0 - cos_i * cos_i).max(0.0);
    let sin_t_sq = (n_from / n_to).powi(2) * sin_i_sq;
    if sin_t_sq > 1.0 {
        None
    } else {
        Some((1.0 - sin_t_sq).sqrt())
    }
}

/// Cosine of the critical angle for light traveling from a medium of index
/// `n_from` into a medium of index `n_to < n_from`.
///
/// Returns `0.0` (no critical angle, i.e. no quadrature split needed) when
/// `n_from <= n_to`.
#[must_use]
pub fn cos_critical(n_from: f64, n_to: f64) -> f64 {
    if n_from <= n_to {
        return 0.0;
    }
    let sin_c_sq = (n_to / n_from).powi(2);
    (1.0 - sin_c_sq).max(0.0).sqrt()
}

/// Unpolarized Fresnel reflectance for a ray with incident cosine `cos_i`
/// in a medium of index `n_i` crossing into a medium of index `n_t`.
///
/// Returns `1.0` for angles beyond the critical angle (total internal
/// reflection) and for indices within [`crate::math::constants::EPSILON`]
/// of each other returns `0.0` directly rather than dividing by a
/// near-zero denominator.
///
/// # Examples
///
/// ```
/// use iad_core::fresnel::r_fresnel;
///
/// // Normal incidence, air into glass (n = 1.0 -> 1.5): ~4% reflectance.
/// let r = r_fresnel(1.0, 1.5, 1.0);
/// assert!((r - 0.04).abs() < 0.005);
///
/// // Index-matched boundary: no reflectance regardless of angle.
/// assert_eq!(r_fresnel(1.4, 1.4, 0.3), 0.0);
/// ```
#[must_use]
pub fn r_fresnel(n_i: f64, n_t: f64, cos_i: f64) -> f64 {
    if (n_i - n_t).abs() < EPSILON {
        return 0.0;
    }
    let cos_i = cos_i.clamp(0.0, 1.0);

    let cos_t = match cos_snell(n_i, n_t, cos_i) {
        Some(c) => c,
        None => return 1.0,
    };

    if cos_i < EPSILON {
        // Grazing incidence: both polarizations tend to unit reflectance.
        return 1.0;
    }

    let rs_num = n_i * cos_i - n_t * cos_t;
    let rs_den = n_i * cos_i + n_t * cos_t;
    let rs = (rs_num / rs_den).powi(2);

    let rp_num = n_t * cos_i - n_i * cos_t;
    let rp_den = n_t * cos_i + n_i * cos_t;
    let rp = (rp_num / rp_den).powi(2);

    0.5 * (rs + rp)
}

/// Reflectance and transmittance of a single bare specular dielectric
/// boundary at incident cosine `cos_i`, from a medium of index `n_i` into
/// a medium of index `n_t`.
///
/// `T = 1 - R` here; a bare interface has no absorption, so flux not
/// reflected is transmitted.
fn bare_interface_rt(n_i: f64, n_t: f64, cos_i: f64) -> (f64, f64) {
    let r = r_fresnel(n_i, n_t, cos_i);
    (r, 1.0 - r)
}

/// Closed-form reflectance and transmittance through a three-medium
/// specular stack — `n_top` on the incident side, a slab of index
/// `n_slab` and optical thickness `b_slab` (attenuation `exp(-b/mu)`
/// inside it), and `n_bot` beyond — at incident cosine `mu_inc` in
/// `n_top`, with the multiple internal reflections between the slab's two
/// faces summed as a geometric series rather than truncated at one pass.
///
/// Reduces exactly to [`bare_interface_rt`] for `n_top, n_slab, n_bot`
/// when `n_slab == n_bot` and `b_slab == 0.0`, since the second interface
/// then carries no reflectance and the attenuation is unity.
#[must_use]
pub fn specular_rt(n_top: f64, n_slab: f64, n_bot: f64, b_slab: f64, mu_inc: f64) -> (f64, f64) {
    let (r1, t1) = bare_interface_rt(n_top, n_slab, mu_inc);

    let mu_slab = cos_snell(n_top, n_slab, mu_inc).unwrap_or(mu_inc);
    let attenuation = (-b_slab / mu_slab.max(EPSILON)).exp();

    let (r2, t2) = bare_interface_rt(n_slab, n_bot, mu_slab);

    // Each round trip inside the slab picks up one more factor of
    // `r1 * r2 * attenuation^2`; summing the geometric series gives the
    // closed form below instead of truncating at the first bounce. `t1`
    // stands in for the slab-to-top transmittance on the return leg too,
    // since an unpolarized bare interface's reflectance is the same seen
    // from either side at Snell-conjugate angles.
    let round_trip = r1 * r2 * attenuation * attenuation;
    let denom = (1.0 - round_trip).max(EPSILON);

    let t = t1 * attenuation * t2 / denom;
    let r = r1 + t1 * attenuation * r2 * attenuation * t1 / denom;

    (r.clamp(0.0, 1.0), t.clamp(0.0, 1.0))
}

/// Reflectance and transmittance of a slide of absorbing glass with
/// refractive index `n_glass`, thickness-derived absorbance `b_glass`
/// (i.e. `mu_a * thickness`), sitting between air (`n_air`) on the
/// incident side and the sample (`n_slab`) on the exit side, at incident
/// cosine `mu`. The slide alone, air-glass-sample, as its own
/// three-medium [`specular_rt`] stack.
#[must_use]
pub fn absorbing_glass_rt(n_air: f64, n_glass: f64, n_slab: f64, mu: f64, b_glass: f64) -> (f64, f64) {
    specular_rt(n_air, n_glass, n_slab, b_glass, mu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_incidence_air_glass() {
        let r = r_fresnel(1.0, 1.5, 1.0);
        assert!((r - 0.04).abs() < 0.005, "r = {r}");
    }

    #[test]
    fn index_matched_boundary_has_no_reflectance() {
        for cos_i in [0.1, 0.5, 0.9, 1.0] {
            assert_eq!(r_fresnel(1.33, 1.33, cos_i), 0.0);
        }
    }

    #[test]
    fn total_internal_reflection_beyond_critical_angle() {
        let nu_c = cos_critical(1.5, 1.0);
        assert!(nu_c > 0.0 && nu_c < 1.0);
        let r = r_fresnel(1.5, 1.0, nu_c * 0.5);
        assert_eq!(r, 1.0);
    }

    #[test]
    fn no_critical_angle_when_entering_denser_medium() {
        assert_eq!(cos_critical(1.0, 1.5), 0.0);
    }

    #[test]
    fn specular_rt_conserves_flux_without_absorption() {
        let (r, t) = specular_rt(1.0, 1.5, 1.0, 0.0, 0.7);
        assert!((r + t - 1.0).abs() < 1e-9, "r={r} t={t}");
    }

    #[test]
    fn specular_rt_reduces_to_bare_interface_when_slab_matches_exit_medium() {
        let (r, t) = specular_rt(1.0, 1.5, 1.5, 0.0, 0.6);
        let (r_bare, t_bare) = bare_interface_rt(1.0, 1.5, 0.6);
        assert!((r - r_bare).abs() < 1e-12);
        assert!((t - t_bare).abs() < 1e-12);
    }

    #[test]
    fn specular_rt_sums_internal_reflections_past_one_bounce() {
        // A glass slab suspended in air on both sides reflects more than a
        // single bare interface would, since light bounced back by the far
        // face partially re-reflects off the near face instead of escaping.
        let (r_stack, _) = specular_rt(1.0, 1.5, 1.0, 0.0, 1.0);
        let (r_bare, _) = bare_interface_rt(1.0, 1.5, 1.0);
        assert!(r_stack > r_bare, "r_stack={r_stack} r_bare={r_bare}");
    }

    #[test]
    fn absorbing_glass_attenuates_more_at_higher_tau() {
        let (_, t_thin) = absorbing_glass_rt(1.0, 1.5, 1.0, 1.0, 0.01);
        let (_, t_thick) = absorbing_glass_rt(1.0, 1.5, 1.0, 1.0, 1.0);
        assert!(t_thick < t_thin);
    }

    #[test]
    fn snell_round_trip_matches_cosine() {
        let cos_i = 0.8;
        let cos_t = cos_snell(1.0, 1.5, cos_i).unwrap();
        let cos_back = cos_snell(1.5, 1.0, cos_t).unwrap();
        assert!((cos_back - cos_i).abs() < 1e-10);
    }
}
