//! Gauss-Legendre, Gauss-Radau, and Gauss-Lobatto quadrature on cosine of
//! angle, plus the sample-specific rule that splits at the critical angle.
//!
//! All three base rules share one shape: find zeros of a Legendre-family
//! polynomial via Newton iteration from an asymptotic starting guess, then
//! derive weights from a closed form evaluated at those zeros. [`gauss`],
//! [`radau`], and [`lobatto`] follow that shape in turn.

use crate::error::{IadError, Result};
use crate::math::{constants, legendre};

/// A quadrature rule: ordered cosines and matching weights on `(0, 1]`,
/// plus the derived `2*nu*w` products used throughout the engine for flux
/// integrals.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureSet {
    /// Number of directions (`nu.len()`).
    pub n: usize,
    /// Direction cosines, ascending, `0 < nu[0] < .. < nu[n-1] <= 1`.
    pub nu: Vec<f64>,
    /// Weights matching `nu`.
    pub w: Vec<f64>,
    /// `2 * nu[i] * w[i]`, used for flux-conserving contractions.
    pub twonuw: Vec<f64>,
    /// Index of `nu0` within `nu` if an explicit incident direction was
    /// inserted as an extra node (see [`quadrature_for_sample`]).
    pub nu0_index: Option<usize>,
}

impl QuadratureSet {
    fn from_nodes(nu: Vec<f64>, w: Vec<f64>) -> Self {
        let twonuw = nu.iter().zip(&w).map(|(n, w)| 2.0 * n * w).collect();
        Self {
            n: nu.len(),
            nu,
            w,
            twonuw,
            nu0_index: None,
        }
    }

    /// `sum(2 * nu * w)`, which must equal 1.0 to double precision for a
    /// correctly normalized rule on `(0, 1]` (spec section 4.1 invariant).
    #[must_use]
    pub fn flux_sum(&self) -> f64 {
        self.twonuw.iter().sum()
    }
}

/// Newton's method on `P_n(x) = 0`, starting from the classical asymptotic
/// guess `cos(pi*(i - 1/4)/(n + 1/2))`.
fn newton_legendre_zero(n: u32, initial_guess: f64, rule: &'static str, index: usize) -> Result<f64> {
    let mut x = initial_guess;
    for _ in 0..100 {
        let (p, dp) = legendre(n, x);
        if dp.abs() < 1e-300 {
            break;
        }
        let dx = p / dp;
        x -= dx;
        if dx.abs() < constants::NEWTON_TOLERANCE {
            return Ok(x);
        }
    }
    Err(IadError::QuadratureConvergence { rule, index })
}

/// `n`-point Gauss-Legendre rule on `[-1, 1]`: nodes are the zeros of
/// `P_n`, weights are `2 / ((1 - x^2) P_n'(x)^2)`.
pub fn gauss(n: u32) -> Result<(Vec<f64>, Vec<f64>)> {
    if n == 0 {
        return Ok((Vec::new(), Vec::new()));
    }
    let nf = n as f64;
    let mut nodes = Vec::with_capacity(n as usize);
    let mut weights = Vec::with_capacity(n as usize);

    // Only need the non-negative half; Gauss-Legendre nodes are symmetric.
    let half = (n as usize + 1) / 2;
    for i in 1..=half {
        let guess = ((core::f64::consts::PI * (i as f64 - 0.25)) / (nf + 0.5)).cos();
        let x = newton_legendre_zero(n, guess, "gauss", i - 1)?;
        let (_, dp) = legendre(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        nodes.push(x);
        weights.push(w);
    }

    // Mirror each positive-half node/weight pair across zero; a node within
    // rounding of zero (odd N) contributes once, not twice.
    let mut all = Vec::with_capacity(n as usize);
    for (&x, &w) in nodes.iter().zip(weights.iter()) {
        if x.abs() < 1e-13 {
            all.push((0.0, w));
        } else {
            all.push((x, w));
            all.push((-x, w));
        }
    }
    all.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    let nodes: Vec<f64> = all.iter().map(|(x, _)| *x).collect();
    let weights: Vec<f64> = all.iter().map(|(_, w)| *w).collect();

    Ok((nodes, weights))
}

/// `n`-point Gauss-Radau rule on `[-1, 1]` with the fixed node pinned at
/// `+1`. Built from the textbook rule (fixed node at `-1`) by reflection,
/// since the unit weight function on `[-1, 1]` is symmetric.
pub fn radau(n: u32) -> Result<(Vec<f64>, Vec<f64>)> {
    if n == 0 {
        return Ok((Vec::new(), Vec::new()));
    }
    if n == 1 {
        return Ok((vec![1.0], vec![2.0]));
    }

    let nf = n as f64;
    // Interior nodes (i = 2..n in the -1-pinned convention) are zeros of
    // Q(x) = P_{n-1}(x) + P_n(x); fixed node is x = -1, weight 2/n^2.
    let mut interior = Vec::with_capacity(n as usize - 1);
    for i in 1..n {
        // Asymptotic guess spread across (-1, 1), biased away from -1.
        let guess = ((core::f64::consts::PI * (2.0 * i as f64 - 0.5)) / (2.0 * nf - 1.0)).cos();
        let mut x = guess;
        for _ in 0..100 {
            let (p_n1, dp_n1) = legendre(n - 1, x);
            let (p_n, dp_n) = legendre(n, x);
            let q = p_n1 + p_n;
            let dq = dp_n1 + dp_n;
            if dq.abs() < 1e-300 {
                break;
            }
            let dx = q / dq;
            x -= dx;
            if dx.abs() < constants::NEWTON_TOLERANCE {
                break;
            }
        }
        interior.push(x);
    }
    interior.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut nodes_neg1 = vec![-1.0];
    nodes_neg1.extend(interior.iter().copied());

    let mut weights_neg1 = Vec::with_capacity(n as usize);
    weights_neg1.push(2.0 / (nf * nf));
    for &x in &interior {
        let (p_n1, _) = legendre(n - 1, x);
        let w = (1.0 - x) / (nf * nf * p_n1 * p_n1);
        weights_neg1.push(w);
    }

    // Reflect x -> -x to pin the fixed node at +1 instead of -1.
    let mut pairs: Vec<(f64, f64)> = nodes_neg1
        .iter()
        .zip(weights_neg1.iter())
        .map(|(&x, &w)| (-x, w))
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    Ok((pairs.iter().map(|p| p.0).collect(), pairs.iter().map(|p| p.1).collect()))
}

/// `n`-point Gauss-Lobatto rule on `[-1, 1]`, pinned at both `-1` and `+1`.
/// Interior nodes are zeros of `P_{n-1}'`.
pub fn lobatto(n: u32) -> Result<(Vec<f64>, Vec<f64>)> {
    if n < 2 {
        return Err(IadError::ParamOutOfRange {
            param: "N",
            value: n.to_string(),
            expected: "N >= 2 for a Lobatto rule",
        });
    }
    let nf = n as f64;
    if n == 2 {
        return Ok((vec![-1.0, 1.0], vec![1.0, 1.0]));
    }

    let m = n - 2; // interior node count
    let mut interior = Vec::with_capacity(m as usize);
    for i in 1..=m {
        let guess = ((core::f64::consts::PI * i as f64) / (m as f64 + 1.0)).cos();
        let mut x = guess;
        for _ in 0..100 {
            // P'_{n-1}(x) root: use the ODE relation for the second
            // derivative to Newton-iterate on P'.
            let (p, dp) = legendre(n - 1, x);
            let denom = 1.0 - x * x;
            let ddp = if denom.abs() < 1e-14 {
                break;
            } else {
                (2.0 * x * dp - (nf - 1.0) * nf * p) / denom
            };
            if ddp.abs() < 1e-300 {
                break;
            }
            let dx = dp / ddp;
            x -= dx;
            if dx.abs() < constants::NEWTON_TOLERANCE {
                break;
            }
        }
        interior.push(x);
    }
    interior.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut nodes = vec![-1.0];
    nodes.extend(interior.iter().copied());
    nodes.push(1.0);

    let mut weights = Vec::with_capacity(n as usize);
    for &x in &nodes {
        let (p, _) = legendre(n - 1, x);
        let w = 2.0 / (nf * (nf - 1.0) * p * p);
        weights.push(w);
    }

    Ok((nodes, weights))
}

/// Rescales a base rule from `[-1, 1]` to `(0, 1]` (the engine only ever
/// integrates over one hemisphere of direction cosines).
fn rescale_to_unit_interval(nodes: &[f64], weights: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let nu = nodes.iter().map(|x| 0.5 * (x + 1.0)).collect();
    let w = weights.iter().map(|w| 0.5 * w).collect();
    (nu, w)
}

/// Builds the quadrature set used by a forward pass, following spec 4.1:
///
/// - `N == 1` with `nu0 == 1.0`: a single Radau node pinned at 1.
/// - `N > 1` and the sample index differs from the surrounding medium:
///   split at the critical cosine, Gauss below it and Radau (pinned at 1)
///   above it.
/// - `N > 1` and indices match: plain Gauss on `(0, 1]`.
/// - A non-normal incident cosine `nu0` is inserted as an extra node with a
///   Lobatto-style weight if it is not already present.
pub fn quadrature_for_sample(n_quad: u32, n_sample: f64, n_external: f64, nu0: f64) -> Result<QuadratureSet> {
    if n_quad < 1 {
        return Err(IadError::ParamOutOfRange {
            param: "N",
            value: n_quad.to_string(),
            expected: "N >= 1",
        });
    }
    if nu0 <= 0.0 || nu0 > 1.0 {
        return Err(IadError::ParamOutOfRange {
            param: "nu0",
            value: nu0.to_string(),
            expected: "(0, 1]",
        });
    }

    if n_quad == 1 {
        let (nodes, weights) = radau(1)?;
        let (nu, w) = rescale_to_unit_interval(&nodes, &weights);
        return Ok(QuadratureSet::from_nodes(nu, w));
    }

    let nu_c = crate::fresnel::cos_critical(n_sample, n_external);

    let mut nu;
    let mut w;
    if nu_c > 0.0 {
        // Split proportionally to the critical-angle fraction, keeping at
        // least one point on each side.
        let n1 = ((n_quad as f64) * nu_c).round().clamp(1.0, (n_quad - 1) as f64) as u32;
        let n2 = n_quad - n1;

        let (g_nodes, g_weights) = gauss(n1)?;
        let (g_nu, g_w): (Vec<f64>, Vec<f64>) = g_nodes
            .iter()
            .zip(&g_weights)
            .map(|(&x, &wt)| (0.5 * nu_c * (x + 1.0), 0.5 * nu_c * wt))
            .unzip();

        let (r_nodes, r_weights) = radau(n2)?;
        let (r_nu, r_w): (Vec<f64>, Vec<f64>) = r_nodes
            .iter()
            .zip(&r_weights)
            .map(|(&x, &wt)| {
                let lo = nu_c;
                let hi = 1.0;
                (lo + 0.5 * (hi - lo) * (x + 1.0), 0.5 * (hi - lo) * wt)
            })
            .unzip();

        nu = g_nu;
        w = g_w;
        nu.extend(r_nu);
        w.extend(r_w);
    } else {
        let (nodes, weights) = gauss(n_quad)?;
        let (full_nu, full_w) = rescale_to_unit_interval(&nodes, &weights);
        nu = full_nu;
        w = full_w;
    }

    let mut set = QuadratureSet::from_nodes(nu.clone(), w.clone());

    // Insert nu0 as an explicit node if it is not already present.
    if !nu.iter().any(|&n| (n - nu0).abs() < 1e-9) {
        let insert_at = nu.partition_point(|&n| n < nu0);
        // Lobatto-style weight: split the neighboring interval's flux
        // contribution so sum(2 nu w) stays close to 1; a small weight
        // relative to its neighbors keeps it from perturbing the rest of
        // the flux balance.
        let neighbor_w = if insert_at < w.len() {
            w[insert_at]
        } else if insert_at > 0 {
            w[insert_at - 1]
        } else {
            1.0 / (2.0 * nu0)
        };
        let extra_w = 0.25 * neighbor_w;
        nu.insert(insert_at, nu0);
        w.insert(insert_at, extra_w);

        // Inserting a node without removing flux from its neighbors
        // breaks the `sum(2 nu w) == 1` invariant for any nu0 away from
        // the rule's own nodes; rescale every weight by the ratio needed
        // to restore it exactly rather than just the two neighbors, since
        // the unnormalized flux error isn't confined to them alone.
        let unnormalized = QuadratureSet::from_nodes(nu, w);
        let scale = 1.0 / unnormalized.flux_sum();
        let scaled_w: Vec<f64> = unnormalized.w.iter().map(|&wi| wi * scale).collect();
        set = QuadratureSet::from_nodes(unnormalized.nu, scaled_w);
        set.nu0_index = Some(insert_at);
    } else {
        let idx = set.nu.iter().position(|&n| (n - nu0).abs() < 1e-9);
        set.nu0_index = idx;
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauss_flux_sum_is_one() {
        for n in [2, 4, 8, 16, 32] {
            let (nodes, weights) = gauss(n).unwrap();
            let (nu, w) = rescale_to_unit_interval(&nodes, &weights);
            let sum: f64 = nu.iter().zip(&w).map(|(n, w)| 2.0 * n * w).sum();
            assert!((sum - 1.0).abs() < 1e-10, "N={n}: sum={sum}");
        }
    }

    #[test]
    fn radau_pins_node_at_one() {
        for n in [2, 4, 8] {
            let (nodes, _) = radau(n).unwrap();
            let max = nodes.iter().cloned().fold(f64::MIN, f64::max);
            assert!((max - 1.0).abs() < 1e-9, "N={n}: max node = {max}");
        }
    }

    #[test]
    fn lobatto_pins_both_ends() {
        for n in [3, 5, 9] {
            let (nodes, _) = lobatto(n).unwrap();
            assert!((nodes[0] - -1.0).abs() < 1e-9);
            assert!((nodes[nodes.len() - 1] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn lobatto_weights_sum_to_two() {
        for n in [3, 5, 9] {
            let (_, weights) = lobatto(n).unwrap();
            let sum: f64 = weights.iter().sum();
            assert!((sum - 2.0).abs() < 1e-9, "N={n}: sum={sum}");
        }
    }

    #[test]
    fn index_matched_quadrature_has_no_split() {
        let q = quadrature_for_sample(8, 1.0, 1.0, 1.0).unwrap();
        assert_eq!(q.n, 8);
        assert!((q.flux_sum() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn mismatched_index_inserts_critical_split() {
        let q = quadrature_for_sample(8, 1.4, 1.0, 1.0).unwrap();
        assert_eq!(q.n, 8);
        assert!(q.nu.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn oblique_incidence_node_insertion_preserves_flux_sum() {
        let q = quadrature_for_sample(8, 1.0, 1.0, 0.5).unwrap();
        assert_eq!(q.n, 9);
        assert!((q.flux_sum() - 1.0).abs() < 1e-9, "flux_sum={}", q.flux_sum());
        assert!(q.nu0_index.is_some());
        let idx = q.nu0_index.unwrap();
        assert!((q.nu[idx] - 0.5).abs() < 1e-9);
    }
}
