//! Property-based tests for the invariants spec section 8 calls out that
//! aren't already covered by a per-module unit test: energy conservation,
//! the pure-absorption closed form, and top/bottom symmetry.

use iad_core::sample::{forward, rt_matrices, ForwardOptions, Sample};
use proptest::prelude::*;

proptest! {
    /// Property 1: for a non-absorbing medium (`a = 1`), every photon that
    /// enters must eventually leave through the front or back face.
    #[test]
    fn energy_conservation_for_non_absorbing_medium(
        b in 0.1f64..8.0,
        g in -0.9f64..0.9f64,
    ) {
        let sample = Sample {
            a: 1.0,
            b,
            g,
            d: 1.0,
            n_sample: 1.0,
            n_above: 1.0,
            n_below: 1.0,
            nu0: 1.0,
            n_quad: 8,
        };
        let result = forward(&sample, ForwardOptions::default()).unwrap();
        prop_assert!((result.ur1 + result.ut1 - 1.0).abs() < 1e-3, "ur1={} ut1={}", result.ur1, result.ut1);
    }

    /// Property 2: with no scattering (`a = 0`) and index-matched
    /// boundaries, transmittance reduces to pure Beer's law and nothing
    /// reflects.
    #[test]
    fn pure_absorption_matches_beers_law_with_matched_boundaries(b in 0.1f64..6.0) {
        let sample = Sample {
            a: 0.0,
            b,
            g: 0.0,
            d: 1.0,
            n_sample: 1.0,
            n_above: 1.0,
            n_below: 1.0,
            nu0: 1.0,
            n_quad: 8,
        };
        let result = forward(&sample, ForwardOptions::default()).unwrap();
        let expected_ut1 = (-b).exp();
        prop_assert!((result.ut1 - expected_ut1).abs() < 1e-3, "ut1={} expected={}", result.ut1, expected_ut1);
        prop_assert!(result.ur1 < 1e-6, "expected no reflectance with matched boundaries, got {}", result.ur1);
    }

    /// Property 4: with identical slides above and below, the forward and
    /// backward reflectance matrices coincide (`R01 = R10`).
    #[test]
    fn symmetric_slides_give_symmetric_reflectance_matrices(
        a in 0.1f64..0.95f64,
        b in 0.1f64..5.0f64,
        g in -0.5f64..0.5f64,
    ) {
        let sample = Sample {
            a,
            b,
            g,
            d: 1.0,
            n_sample: 1.4,
            n_above: 1.5,
            n_below: 1.5,
            nu0: 1.0,
            n_quad: 8,
        };
        let m = rt_matrices(&sample, ForwardOptions::default()).unwrap();
        let n = m.quad.n;
        let mut max_diff = 0.0f64;
        for i in 0..n {
            for j in 0..n {
                max_diff = max_diff.max((m.r01.get(i, j) - m.r10.get(i, j)).abs());
            }
        }
        prop_assert!(max_diff < 1e-6, "R01/R10 mismatch under symmetric slides: {max_diff}");
    }

    /// Property 3 (partial): as optical thickness grows, transmittance
    /// decays toward zero monotonically for an absorbing medium.
    #[test]
    fn transmittance_decays_toward_zero_as_thickness_grows(a in 0.3f64..0.9f64, g in -0.5f64..0.5f64) {
        let mut sample = Sample {
            a,
            b: 1.0,
            g,
            d: 1.0,
            n_sample: 1.0,
            n_above: 1.0,
            n_below: 1.0,
            nu0: 1.0,
            n_quad: 8,
        };
        sample.b = 1.0;
        let thin = forward(&sample, ForwardOptions::default()).unwrap();
        sample.b = 40.0;
        let thick = forward(&sample, ForwardOptions::default()).unwrap();
        prop_assert!(thick.ut1 < thin.ut1);
        prop_assert!(thick.ut1 < 1e-4, "expected near-zero transmittance at b=40, got {}", thick.ut1);
    }
}
