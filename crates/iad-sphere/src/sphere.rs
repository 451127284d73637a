//! Single- and dual-sphere geometry and the analytic gain closed forms
//! (spec 4.8).
//!
//! A sphere has four named ports (`sample`, `third`, `detector`, `empty`)
//! plus a wall that soaks up whatever area the ports don't cover. Gain is
//! the ratio of detector irradiance to the irradiance a perfect uniform
//! diffuser would cause, averaged over the infinite series of bounces a
//! photon makes before escaping or being absorbed; [`gain_11`] sums that
//! series in closed form for a single sphere, [`gain_22`] couples a
//! reflection sphere and a transmission sphere through the sample's own
//! `(URU, UTU, UR1, UT1)`.

use iad_core::Matrix;

/// A sphere port: its diameter and current reflectance (the reflectance
/// of whatever sits in that port — a sample, a calibration standard, a
/// detector window, or a baffle).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    /// Port diameter, same units as [`Sphere::diameter`].
    pub diameter: f64,
    /// Reflectance of whatever currently occupies this port.
    pub reflectance: f64,
}

impl Port {
    /// Fraction of the sphere's total internal surface area this port
    /// covers, `(diameter / sphere_diameter)^2 / 4`.
    #[must_use]
    pub fn area_fraction(&self, sphere_diameter: f64) -> f64 {
        (self.diameter / sphere_diameter).powi(2) / 4.0
    }
}

/// A single integrating sphere with four named ports and a reflective
/// wall filling the remaining area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Sphere diameter.
    pub diameter: f64,
    /// Port illuminated by (or containing) the sample.
    pub sample: Port,
    /// Third port (e.g. for a calibration standard or baffle viewport).
    pub third: Port,
    /// Detector port.
    pub detector: Port,
    /// Unused/empty port.
    pub empty: Port,
    /// Wall reflectance.
    pub r_wall: f64,
    /// Baffle flag: when set, the first bounce from the illuminated port
    /// cannot reach the detector directly.
    pub baffle: bool,
}

impl Sphere {
    /// Wall area fraction: whatever the four named ports don't cover.
    #[must_use]
    pub fn wall_area_fraction(&self) -> f64 {
        1.0 - self.sample.area_fraction(self.diameter)
            - self.third.area_fraction(self.diameter)
            - self.detector.area_fraction(self.diameter)
            - self.empty.area_fraction(self.diameter)
    }

    /// Average fractional loss per bounce, `M = 1 - a_w r_w - sum(a_i r_i)`.
    #[must_use]
    pub fn average_loss_per_bounce(&self) -> f64 {
        let a_w = self.wall_area_fraction();
        1.0 - a_w * self.r_wall
            - self.sample.area_fraction(self.diameter) * self.sample.reflectance
            - self.third.area_fraction(self.diameter) * self.third.reflectance
            - self.detector.area_fraction(self.diameter) * self.detector.reflectance
            - self.empty.area_fraction(self.diameter) * self.empty.reflectance
    }
}

/// Single-sphere gain under first-bounce illumination of the sample port:
/// the standard sphere-multiplier closed form `G = (1 - baffle_correction) / M`,
/// summing the infinite series of bounces a photon survives before escaping
/// or being absorbed.
///
/// With a baffle present, the first bounce lands on the wall rather than
/// the detector, so the direct sample-port-to-detector coupling
/// (`a_detector * r_sample`) is removed from the numerator before
/// dividing by the per-bounce loss `M`.
#[must_use]
pub fn gain_11(sphere: &Sphere) -> f64 {
    let d = sphere.diameter;
    let a_detector = sphere.detector.area_fraction(d);
    let m = sphere.average_loss_per_bounce();

    let baffle_correction = if sphere.baffle {
        a_detector * sphere.sample.reflectance
    } else {
        0.0
    };

    (1.0 - baffle_correction) / m
}

/// The sample-dependent quantities a two-sphere gain system is coupled
/// through: the sample's diffuse and collimated reflectance/transmittance
/// from [`iad_core::sample::rt`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoSphereInputs {
    /// Diffuse-incident total reflectance.
    pub uru: f64,
    /// Diffuse-incident total transmittance.
    pub utu: f64,
    /// Collimated-incident total reflectance.
    pub ur1: f64,
    /// Collimated-incident total transmittance.
    pub ut1: f64,
}

/// Two-sphere gain: solves the 2x2 linear system coupling the reflection
/// sphere's gain `G_r` and the transmission sphere's gain `G_t` through
/// the sample placed between them.
///
/// Each sphere's own single-sphere gain (as if the sample were a perfect
/// absorber, i.e. [`gain_11`] on `reflection`/`transmission` respectively)
/// sets the diagonal; the sample's `uru`/`utu` couple light that bounces
/// off one sphere, through the sample, into the other.
pub fn gain_22(reflection: &Sphere, transmission: &Sphere, sample: &TwoSphereInputs) -> (f64, f64) {
    let g_r = gain_11(reflection);
    let g_t = gain_11(transmission);

    // [ 1 - g_r*uru      -g_r*utu     ] [G_r]   [g_r]
    // [ -g_t*utu      1 - g_t*uru     ] [G_t] = [g_t]
    //
    // i.e. each sphere's gain is inflated by light reflected/transmitted
    // through the sample and re-admitted by the other sphere's own gain.
    let mut a = Matrix::zeros(2);
    a.set(0, 0, 1.0 - g_r * sample.uru);
    a.set(0, 1, -g_r * sample.utu);
    a.set(1, 0, -g_t * sample.utu);
    a.set(1, 1, 1.0 - g_t * sample.uru);

    let mut rhs = Matrix::zeros(2);
    rhs.set(0, 0, g_r);
    rhs.set(1, 0, g_t);

    let solved = a.solve(&rhs).unwrap_or_else(|_| {
        // Degenerate (e.g. zero-reflectance spheres): fall back to the
        // uncoupled single-sphere gains rather than propagating an error
        // through what is meant to be an infallible closed form.
        let mut fallback = Matrix::zeros(2);
        fallback.set(0, 0, g_r);
        fallback.set(1, 0, g_t);
        fallback
    });

    (solved.get(0, 0), solved.get(1, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_sphere() -> Sphere {
        Sphere {
            diameter: 100.0,
            sample: Port { diameter: 20.0, reflectance: 0.9 },
            third: Port { diameter: 10.0, reflectance: 0.99 },
            detector: Port { diameter: 5.0, reflectance: 0.0 },
            empty: Port { diameter: 5.0, reflectance: 0.05 },
            r_wall: 0.98,
            baffle: false,
        }
    }

    #[test]
    fn area_fractions_sum_to_one_with_wall() {
        let sphere = test_sphere();
        let d = sphere.diameter;
        let sum = sphere.sample.area_fraction(d)
            + sphere.third.area_fraction(d)
            + sphere.detector.area_fraction(d)
            + sphere.empty.area_fraction(d)
            + sphere.wall_area_fraction();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gain_is_positive_for_a_reasonable_sphere() {
        let sphere = test_sphere();
        let g = gain_11(&sphere);
        assert!(g > 0.0 && g.is_finite());
    }

    #[test]
    fn baffle_reduces_gain() {
        let mut sphere = test_sphere();
        let g_no_baffle = gain_11(&sphere);
        sphere.baffle = true;
        let g_baffle = gain_11(&sphere);
        assert!(g_baffle < g_no_baffle);
    }

    #[test]
    fn two_sphere_gain_reduces_to_single_sphere_for_opaque_sample() {
        let reflection = test_sphere();
        let transmission = test_sphere();
        let opaque = TwoSphereInputs { uru: 0.0, utu: 0.0, ur1: 0.0, ut1: 0.0 };
        let (g_r, g_t) = gain_22(&reflection, &transmission, &opaque);
        assert!((g_r - gain_11(&reflection)).abs() < 1e-9);
        assert!((g_t - gain_11(&transmission)).abs() < 1e-9);
    }
}
