//! Derivative-free search: Brent's method for the one-parameter case and
//! a bounded Nelder-Mead simplex for the two/three-parameter cases, both
//! stopping on the `|M_pred - M_obs|` infinity-norm tolerance or an
//! iteration budget.

use crate::bounds::ParameterBound;
use iad_core::error::IadError;
use std::time::Instant;

/// Outcome of a search call: the best point found, the residual there,
/// iterations spent, and whether it actually converged to tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<const N: usize> {
    /// Best parameter vector found.
    pub point: [f64; N],
    /// `|M_pred - M_obs|` at [`Self::point`] (infinity norm across
    /// whichever measurements were targeted).
    pub residual: f64,
    /// Iterations actually performed.
    pub iterations: usize,
    /// True if `residual <= tolerance` was reached before the iteration
    /// budget ran out.
    pub converged: bool,
    /// True if the search stopped because `deadline` passed rather than
    /// because it converged or exhausted `max_iter`.
    pub timed_out: bool,
}

/// Brent's method for minimizing a unimodal scalar function `f` over
/// `bound`, combining golden-section bracketing steps with parabolic
/// interpolation once three points bracket a minimum closely enough.
///
/// This is a derivative-free line search; `f` here is expected to be
/// `|measured_rt(a) - M_obs|` for the one-parameter (`a`-only) case.
pub fn brent_minimize(
    mut f: impl FnMut(f64) -> f64,
    bound: ParameterBound,
    tolerance: f64,
    max_iter: usize,
    deadline: Option<Instant>,
) -> SearchOutcome<1> {
    const GOLDEN: f64 = 0.381_966_011_25; // 2 - golden ratio

    let mut a = bound.min;
    let mut b = bound.max;
    let mut x = a + GOLDEN * (b - a);
    let mut w = x;
    let mut v = x;
    let mut fx = f(x);
    let mut fw = fx;
    let mut fv = fx;
    let mut d = 0.0_f64;
    let mut e = 0.0_f64;

    let mut iterations = 0;
    let mut timed_out = false;
    for _ in 0..max_iter {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            timed_out = true;
            break;
        }
        iterations += 1;
        let mid = 0.5 * (a + b);
        let tol = tolerance.max(1e-12) + 1e-10 * x.abs();
        if (x - mid).abs() <= 2.0 * tol - 0.5 * (b - a) || fx <= tolerance {
            break;
        }

        let mut use_golden = true;
        if e.abs() > tol {
            // Try a parabolic fit through (v, fv), (w, fw), (x, fx).
            let r = (x - w) * (fx - fv);
            let q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            let mut q2 = 2.0 * (q - r);
            if q2 > 0.0 {
                p = -p;
            }
            q2 = q2.abs();
            let e_prev = e;
            e = d;
            if p.abs() < (0.5 * q2 * e_prev).abs() && p > q2 * (a - x) && p < q2 * (b - x) {
                d = p / q2;
                let u = x + d;
                if (u - a) < 2.0 * tol || (b - u) < 2.0 * tol {
                    d = if mid - x >= 0.0 { tol } else { -tol };
                }
                use_golden = false;
            }
        }

        if use_golden {
            e = if x < mid { b - x } else { a - x };
            d = GOLDEN * e;
        }

        let u = if d.abs() >= tol { x + d } else { x + tol.copysign(d.max(1e-300)) };
        let fu = f(u);

        if fu <= fx {
            if u < x {
                b = x;
            } else {
                a = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || (w - x).abs() < 1e-300 {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || (v - x).abs() < 1e-300 || (v - w).abs() < 1e-300 {
                v = u;
                fv = fu;
            }
        }
    }

    SearchOutcome {
        point: [x],
        residual: fx,
        iterations,
        converged: fx <= tolerance,
        timed_out,
    }
}

/// Bounded Nelder-Mead simplex search over `N` parameters, reflecting,
/// expanding, contracting, and shrinking the simplex each iteration.
/// Points are clamped to `bounds` after every move.
pub fn nelder_mead<const N: usize>(
    mut f: impl FnMut(&[f64; N]) -> f64,
    initial: [f64; N],
    bounds: &[ParameterBound; N],
    tolerance: f64,
    max_iter: usize,
    deadline: Option<Instant>,
) -> SearchOutcome<N> {
    let clamp = |mut p: [f64; N]| -> [f64; N] {
        for i in 0..N {
            p[i] = bounds[i].clamp(p[i]);
        }
        p
    };

    // Build the initial simplex: the starting point plus one perturbation
    // per dimension, scaled to 10% of that dimension's bound width (or a
    // fixed small step if the bound is degenerate).
    let mut simplex: Vec<[f64; N]> = Vec::with_capacity(N + 1);
    simplex.push(clamp(initial));
    for i in 0..N {
        let mut p = initial;
        let step = 0.1 * bounds[i].width().max(1e-6);
        p[i] = (p[i] + step).min(bounds[i].max);
        simplex.push(clamp(p));
    }

    let mut values: Vec<f64> = simplex.iter().map(|p| f(p)).collect();
    let mut iterations = 0;
    let mut timed_out = false;

    for _ in 0..max_iter {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            timed_out = true;
            break;
        }
        iterations += 1;

        let mut order: Vec<usize> = (0..=N).collect();
        order.sort_by(|&i, &j| values[i].partial_cmp(&values[j]).unwrap());
        let best = order[0];
        let worst = order[N];
        let second_worst = order[N - 1];

        if values[best] <= tolerance {
            break;
        }
        let spread = values[worst] - values[best];
        if spread < tolerance * 1e-3 {
            break;
        }

        let mut centroid = [0.0_f64; N];
        for &idx in &order[..N] {
            for k in 0..N {
                centroid[k] += simplex[idx][k] / N as f64;
            }
        }

        let reflect = |p: f64, c: f64, coeff: f64| c + coeff * (c - p);
        let mut reflected = [0.0_f64; N];
        for k in 0..N {
            reflected[k] = reflect(simplex[worst][k], centroid[k], 1.0);
        }
        reflected = clamp(reflected);
        let f_reflected = f(&reflected);

        if f_reflected < values[best] {
            let mut expanded = [0.0_f64; N];
            for k in 0..N {
                expanded[k] = reflect(simplex[worst][k], centroid[k], 2.0);
            }
            expanded = clamp(expanded);
            let f_expanded = f(&expanded);
            if f_expanded < f_reflected {
                simplex[worst] = expanded;
                values[worst] = f_expanded;
            } else {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            }
        } else if f_reflected < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = f_reflected;
        } else {
            let mut contracted = [0.0_f64; N];
            for k in 0..N {
                contracted[k] = reflect(simplex[worst][k], centroid[k], -0.5);
            }
            contracted = clamp(contracted);
            let f_contracted = f(&contracted);
            if f_contracted < values[worst] {
                simplex[worst] = contracted;
                values[worst] = f_contracted;
            } else {
                // Shrink toward the best point.
                for idx in &order[1..] {
                    let idx = *idx;
                    let mut shrunk = [0.0_f64; N];
                    for k in 0..N {
                        shrunk[k] = simplex[best][k] + 0.5 * (simplex[idx][k] - simplex[best][k]);
                    }
                    shrunk = clamp(shrunk);
                    values[idx] = f(&shrunk);
                    simplex[idx] = shrunk;
                }
            }
        }
    }

    let best_idx = (0..=N).min_by(|&i, &j| values[i].partial_cmp(&values[j]).unwrap()).unwrap();
    SearchOutcome {
        point: simplex[best_idx],
        residual: values[best_idx],
        iterations,
        converged: values[best_idx] <= tolerance,
        timed_out,
    }
}

/// Converts a search outcome's non-convergence into an [`IadError`] for
/// callers that want `?`-propagation instead of inspecting `converged`.
pub fn require_converged<const N: usize>(outcome: SearchOutcome<N>) -> Result<SearchOutcome<N>, IadError> {
    if outcome.converged {
        Ok(outcome)
    } else {
        Err(IadError::SearchNoConverge {
            iterations: outcome.iterations,
            residual: outcome.residual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brent_finds_minimum_of_a_parabola() {
        let outcome = brent_minimize(|x| (x - 0.37).powi(2), ParameterBound::new(0.0, 1.0), 1e-8, 200, None);
        assert!((outcome.point[0] - 0.37).abs() < 1e-3, "x = {}", outcome.point[0]);
        assert!(!outcome.timed_out);
    }

    #[test]
    fn brent_honors_a_deadline_already_in_the_past() {
        let deadline = Instant::now();
        let outcome = brent_minimize(|x| (x - 0.37).powi(2), ParameterBound::new(0.0, 1.0), 1e-8, 200, Some(deadline));
        assert!(outcome.timed_out);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn nelder_mead_finds_minimum_of_a_bowl() {
        let bounds = [ParameterBound::new(0.0, 1.0), ParameterBound::new(0.0, 20.0)];
        let outcome = nelder_mead(
            |p: &[f64; 2]| (p[0] - 0.6).powi(2) + ((p[1] - 5.0) / 20.0).powi(2),
            [0.3, 2.0],
            &bounds,
            1e-8,
            500,
            None,
        );
        assert!((outcome.point[0] - 0.6).abs() < 0.05, "a = {}", outcome.point[0]);
        assert!((outcome.point[1] - 5.0).abs() < 1.0, "b = {}", outcome.point[1]);
        assert!(!outcome.timed_out);
    }

    #[test]
    fn nelder_mead_honors_a_deadline_already_in_the_past() {
        let bounds = [ParameterBound::new(0.0, 1.0), ParameterBound::new(0.0, 20.0)];
        let outcome = nelder_mead(
            |p: &[f64; 2]| (p[0] - 0.6).powi(2) + ((p[1] - 5.0) / 20.0).powi(2),
            [0.3, 2.0],
            &bounds,
            1e-8,
            500,
            Some(Instant::now()),
        );
        assert!(outcome.timed_out);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn require_converged_rejects_an_unconverged_outcome() {
        let outcome = SearchOutcome::<1> {
            point: [0.5],
            residual: 1.0,
            iterations: 10,
            converged: false,
            timed_out: false,
        };
        assert!(require_converged(outcome).is_err());
    }
}
