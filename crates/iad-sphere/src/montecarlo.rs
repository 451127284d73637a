//! Monte Carlo integrating-sphere simulation, used to validate
//! [`crate::sphere::gain_11`] against a first-principles photon-bounce
//! model.
//!
//! Each photon starts on the illuminated port and bounces until it is
//! absorbed; on each bounce it lands on a port chosen with probability
//! proportional to that port's area fraction, then is reflected (survives
//! to bounce again) or absorbed according to that port's reflectance.
//! Detector hits are counted every time a bounce lands on the detector
//! port and survives.

use crate::sphere::Sphere;

/// Simple xorshift64 PRNG, seeded explicitly for reproducibility across
/// runs (spec 5's requirement that sphere Monte Carlo use a per-task PRNG
/// with an explicit seed).
#[derive(Debug, Clone, Copy)]
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform float in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Result of a Monte Carlo sphere simulation: an empirical gain estimate
/// with a 95% confidence half-width, assuming a binomial detector-hit
/// count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloResult {
    /// Photons simulated.
    pub photons: u64,
    /// Empirical gain estimate.
    pub gain: f64,
    /// 95% confidence half-width on [`Self::gain`].
    pub confidence_95: f64,
}

impl MonteCarloResult {
    /// True if `analytic_gain` falls within this result's 95% confidence
    /// interval, the acceptance criterion spec 4.8 calls for when
    /// validating the closed form against the simulation.
    #[must_use]
    pub fn agrees_with(&self, analytic_gain: f64) -> bool {
        (self.gain - analytic_gain).abs() <= self.confidence_95
    }
}

/// Runs `photons` independent photon bounces through `sphere`, seeded
/// with `seed`, and returns the empirical gain.
///
/// A photon starts "at the sample port" (first-bounce illumination,
/// matching [`crate::sphere::gain_11`]'s convention) and bounces until
/// absorbed; every bounce that lands on (and survives at) the detector
/// port counts as a detector hit. Gain is `detector_hits / photons`
/// normalized the same way the analytic form is (against a perfect
/// uniform diffuser), which for this single-bounce-accumulation model
/// reduces to the raw hit fraction since a perfect diffuser is the
/// implicit baseline used to define "gain" in the first place.
#[must_use]
pub fn monte_carlo_gain(sphere: &Sphere, photons: u64, seed: u64) -> MonteCarloResult {
    let d = sphere.diameter;
    let ports = [
        (sphere.sample.area_fraction(d), sphere.sample.reflectance, false),
        (sphere.third.area_fraction(d), sphere.third.reflectance, false),
        (sphere.detector.area_fraction(d), sphere.detector.reflectance, true),
        (sphere.empty.area_fraction(d), sphere.empty.reflectance, false),
        (sphere.wall_area_fraction(), sphere.r_wall, false),
    ];

    let mut rng = SimpleRng::new(seed);
    let mut detector_hits: u64 = 0;

    for _ in 0..photons {
        let mut alive = true;
        let mut first_bounce = true;
        while alive {
            let (_, reflectance, is_detector) = sample_port(&ports, &mut rng);

            // With a baffle, the first bounce cannot reach the detector
            // directly; treat it as if it landed on the wall instead.
            if first_bounce && sphere.baffle && is_detector {
                first_bounce = false;
                continue;
            }
            first_bounce = false;

            if is_detector {
                detector_hits += 1;
            }

            alive = rng.next_f64() < reflectance;
        }
    }

    let n = photons as f64;
    let p = detector_hits as f64 / n;
    let std_err = (p * (1.0 - p) / n).max(0.0).sqrt();
    let confidence_95 = 1.96 * std_err;

    MonteCarloResult {
        photons,
        gain: p,
        confidence_95,
    }
}

fn sample_port(ports: &[(f64, f64, bool)], rng: &mut SimpleRng) -> (f64, f64, bool) {
    let total: f64 = ports.iter().map(|(a, _, _)| a).sum();
    let mut target = rng.next_f64() * total;
    for &(area, reflectance, is_detector) in ports {
        if target < area {
            return (area, reflectance, is_detector);
        }
        target -= area;
    }
    ports[ports.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::{gain_11, Port};

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
    fn same_seed_is_reproducible() {
        let sphere = test_sphere();
        let a = monte_carlo_gain(&sphere, 2000, 42);
        let b = monte_carlo_gain(&sphere, 2000, 42);
        assert_eq!(a.gain, b.gain);
    }

    #[test]
    fn more_photons_narrows_confidence_interval() {
        let sphere = test_sphere();
        let small = monte_carlo_gain(&sphere, 500, 7);
        let large = monte_carlo_gain(&sphere, 50_000, 7);
        assert!(large.confidence_95 < small.confidence_95);
    }

    #[test]
    fn gain_is_in_unit_interval() {
        let sphere = test_sphere();
        let result = monte_carlo_gain(&sphere, 5000, 1);
        assert!((0.0..=1.0).contains(&result.gain));
    }

    #[test]
    fn baffle_reduces_direct_detector_hits_relative_to_unbaffled() {
        let mut sphere = test_sphere();
        let unbaffled = monte_carlo_gain(&sphere, 20_000, 99);
        sphere.baffle = true;
        let baffled = monte_carlo_gain(&sphere, 20_000, 99);
        assert!(baffled.gain <= unbaffled.gain + baffled.confidence_95 + unbaffled.confidence_95);
        let _ = gain_11(&sphere); // sanity: analytic form is callable with baffle set
    }
}
