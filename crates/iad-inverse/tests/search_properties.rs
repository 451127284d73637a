//! Property tests for the derivative-free search primitives, independent
//! of the full inverse pipeline: Brent's method must find the minimum of
//! a plain convex function, and parameter bounds must clamp consistently.

use iad_inverse::bounds::ParameterBound;
use iad_inverse::search::brent_minimize;
use proptest::prelude::*;

proptest! {
    #[test]
    fn brent_finds_minimum_of_a_shifted_parabola(
        target in 0.05f64..0.95,
    ) {
        let bound = ParameterBound::new(0.0, 1.0);
        let outcome = brent_minimize(|x| (x - target).powi(2), bound, 1e-8, 200, None);
        prop_assert!(outcome.converged, "did not converge toward target={target}");
        prop_assert!((outcome.point[0] - target).abs() < 1e-3, "point={} target={target}", outcome.point[0]);
    }

    #[test]
    fn clamp_always_stays_within_bounds(min in -5.0f64..5.0, span in 0.1f64..10.0, value in -20.0f64..20.0) {
        let bound = ParameterBound::new(min, min + span);
        let clamped = bound.clamp(value);
        prop_assert!(clamped >= bound.min - 1e-12 && clamped <= bound.max + 1e-12);
    }

    #[test]
    fn contains_agrees_with_clamp_being_a_no_op(min in -5.0f64..5.0, span in 0.1f64..10.0, value in -20.0f64..20.0) {
        let bound = ParameterBound::new(min, min + span);
        let clamped = bound.clamp(value);
        prop_assert!(bound.contains(clamped));
        if bound.contains(value) {
            prop_assert!((clamped - value).abs() < 1e-12);
        }
    }
}
