//! Property tests for the analytic sphere gain closed forms: gain must
//! stay positive and finite across realistic port geometries, and an
//! opaque sample must make the two-sphere system decouple into the
//! single-sphere gains.

use iad_sphere::sphere::{gain_11, gain_22, Port, Sphere, TwoSphereInputs};
use proptest::prelude::*;

fn sphere_with(diameter: f64, sample_r: f64, detector_r: f64, r_wall: f64, baffle: bool) -> Sphere {
    Sphere {
        diameter,
        sample: Port { diameter: diameter * 0.3, reflectance: sample_r },
        third: Port { diameter: diameter * 0.2, reflectance: 0.95 },
        detector: Port { diameter: diameter * 0.15, reflectance: detector_r },
        empty: Port { diameter: 0.0, reflectance: 0.0 },
        r_wall,
        baffle,
    }
}

proptest! {
    #[test]
    fn gain_is_always_positive_and_finite(
        sample_r in 0.0f64..1.0,
        detector_r in 0.0f64..1.0,
        r_wall in 0.5f64..0.99,
        baffle in any::<bool>(),
    ) {
        let sphere = sphere_with(60.0, sample_r, detector_r, r_wall, baffle);
        let gain = gain_11(&sphere);
        prop_assert!(gain.is_finite());
        prop_assert!(gain > 0.0, "gain={gain}");
    }

    #[test]
    fn higher_wall_reflectance_never_decreases_gain(
        sample_r in 0.0f64..1.0,
        r_wall_low in 0.5f64..0.8,
        r_wall_delta in 0.0f64..0.15,
    ) {
        let low = sphere_with(60.0, sample_r, 0.5, r_wall_low, false);
        let high = sphere_with(60.0, sample_r, 0.5, r_wall_low + r_wall_delta, false);
        prop_assert!(gain_11(&high) >= gain_11(&low) - 1e-9);
    }

    #[test]
    fn opaque_sample_decouples_two_sphere_gain(r_wall in 0.5f64..0.99) {
        let reflection = sphere_with(60.0, 0.95, 0.5, r_wall, false);
        let transmission = sphere_with(60.0, 0.0, 0.5, r_wall, false);
        let sample = TwoSphereInputs { uru: 0.0, utu: 0.0, ur1: 0.0, ut1: 0.0 };
        let (g_r, g_t) = gain_22(&reflection, &transmission, &sample);
        prop_assert!((g_r - gain_11(&reflection)).abs() < 1e-9);
        prop_assert!((g_t - gain_11(&transmission)).abs() < 1e-9);
    }
}
