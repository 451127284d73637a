//! Experiment description and the forward measurement predictor (C9),
//! plus the inverse search dispatch that recovers `(a, b, g)` from a
//! measured `(M_R, M_T, M_U)` triplet.

use crate::agrid::AGrid;
use crate::bounds::ParameterBound;
use crate::search::{brent_minimize, nelder_mead, SearchOutcome};
use iad_core::config::{InverseConfig, SearchMode, WarmStart};
use iad_core::error::{IadError, Result};
use iad_core::sample::{forward, rt, rt_matrices, ForwardOptions, Sample};
use iad_sphere::sphere::{gain_11, gain_22, Sphere, TwoSphereInputs};
use std::time::Instant;

/// Optional sphere configuration plus calibration-standard reflectances
/// for the reflection and transmission arms of an instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereConfig {
    /// Reflection-side sphere, if the instrument has one.
    pub reflection: Option<Sphere>,
    /// Transmission-side sphere, if the instrument has one.
    pub transmission: Option<Sphere>,
    /// Reflectance of the calibration standard used to normalize `M_R`.
    pub r_standard: f64,
    /// Transmittance of the calibration standard used to normalize `M_T`.
    pub t_standard: f64,
}

/// A single-wavelength experiment: the sample under test, the instrument
/// that measured it, and (optionally) the measurement triplet being
/// inverted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Experiment {
    /// Sample under test.
    pub sample: Sample,
    /// Instrument sphere configuration.
    pub spheres: SphereConfig,
    /// Whether the direct (unscattered) specular beam is included in the
    /// reported `M_R`/`M_T`.
    pub includes_direct_beam: bool,
    /// Measured total reflectance, if available.
    pub m_r: Option<f64>,
    /// Measured total transmittance, if available.
    pub m_t: Option<f64>,
    /// Measured unscattered transmittance, if available.
    pub m_u: Option<f64>,
}

/// Predicted measurement triplet from the forward model, matching
/// whichever of `(M_R, M_T, M_U)` the instrument configuration can
/// produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedMeasurement {
    /// Predicted total reflectance.
    pub m_r: Option<f64>,
    /// Predicted total transmittance.
    pub m_t: Option<f64>,
    /// Predicted unscattered transmittance.
    pub m_u: Option<f64>,
}

/// Unscattered (collimated, unattenuated-by-scattering) transmission
/// through the sample, `exp(-b / nu0)` by Beer's law on the total
/// extinction coefficient.
#[must_use]
pub fn unscattered_transmission(sample: &Sample) -> f64 {
    (-sample.b / sample.nu0).exp()
}

/// Specular (zero-scattering) reflectance off the sample's front
/// boundary at `nu0` — the direct-beam component `measured_rt` subtracts
/// from `UR1` when the instrument excludes the direct beam.
#[must_use]
pub fn specular_reflection(sample: &Sample) -> f64 {
    iad_core::fresnel::r_fresnel(sample.n_above, sample.n_sample, sample.nu0)
}

/// Runs the forward model for `experiment.sample` and folds in whichever
/// sphere gains the instrument configuration calls for, producing the
/// predicted measurement triplet (spec 4.9's `measured_rt`).
pub fn measured_rt(experiment: &Experiment, opts: ForwardOptions) -> Result<PredictedMeasurement> {
    let matrices = rt_matrices(&experiment.sample, opts)?;
    let scalars = rt(&experiment.sample, &matrices);
    let m_u = unscattered_transmission(&experiment.sample);

    match (experiment.spheres.reflection, experiment.spheres.transmission) {
        (None, None) => {
            let m_r = if experiment.includes_direct_beam {
                scalars.ur1
            } else {
                (scalars.ur1 - specular_reflection(&experiment.sample)).max(0.0)
            };
            let m_t = if experiment.includes_direct_beam {
                scalars.ut1
            } else {
                (scalars.ut1 - m_u).max(0.0)
            };
            Ok(PredictedMeasurement {
                m_r: Some(m_r),
                m_t: Some(m_t),
                m_u: Some(m_u),
            })
        }
        (Some(reflection), None) => {
            let gain = gain_11(&reflection);
            let m_r = scalars.uru * gain / experiment.spheres.r_standard.max(1e-12);
            Ok(PredictedMeasurement {
                m_r: Some(m_r),
                m_t: Some(scalars.ut1),
                m_u: Some(m_u),
            })
        }
        (None, Some(transmission)) => {
            let gain = gain_11(&transmission);
            let m_t = scalars.utu * gain / experiment.spheres.t_standard.max(1e-12);
            Ok(PredictedMeasurement {
                m_r: Some(scalars.ur1),
                m_t: Some(m_t),
                m_u: Some(m_u),
            })
        }
        (Some(reflection), Some(transmission)) => {
            let coupling = TwoSphereInputs {
                uru: scalars.uru,
                utu: scalars.utu,
                ur1: scalars.ur1,
                ut1: scalars.ut1,
            };
            let (g_r, g_t) = gain_22(&reflection, &transmission, &coupling);
            let m_r = scalars.uru * g_r / experiment.spheres.r_standard.max(1e-12);
            let m_t = scalars.utu * g_t / experiment.spheres.t_standard.max(1e-12);
            Ok(PredictedMeasurement {
                m_r: Some(m_r),
                m_t: Some(m_t),
                m_u: Some(m_u),
            })
        }
    }
}

/// Checks a finished search outcome for the two failure modes beyond
/// plain non-convergence: a wall-clock timeout, and a result pinned
/// against a search bound without reaching tolerance there — the
/// signature of a measurement outside the physically achievable region,
/// which the search drives toward the boundary closest to it without
/// ever bringing the residual down. A search that *does* converge at a
/// bound (e.g. a genuinely pure-scattering sample at `a = 1`) is a
/// legitimate edge-case answer, not this failure mode. Plain
/// non-convergence away from a bound still comes back `Ok`, with
/// `InverseResult::converged` left `false` for the caller to report as a
/// warning.
fn check_search_outcome<const N: usize>(outcome: SearchOutcome<N>, bounds: &[ParameterBound; N]) -> Result<SearchOutcome<N>> {
    if outcome.timed_out {
        return Err(IadError::Timeout { iterations: outcome.iterations });
    }
    let pinned_without_converging = !outcome.converged
        && outcome
            .point
            .iter()
            .zip(bounds.iter())
            .any(|(&p, b)| b.at_boundary(p, b.width() * 1e-6));
    if pinned_without_converging {
        return Err(IadError::NonPhysical {
            detail: "search pinned against a parameter boundary without reaching tolerance; target is outside the achievable region".into(),
        });
    }
    Ok(outcome)
}

fn residual(predicted: &PredictedMeasurement, experiment: &Experiment) -> f64 {
    let mut worst = 0.0_f64;
    if let (Some(p), Some(o)) = (predicted.m_r, experiment.m_r) {
        worst = worst.max((p - o).abs());
    }
    if let (Some(p), Some(o)) = (predicted.m_t, experiment.m_t) {
        worst = worst.max((p - o).abs());
    }
    if let (Some(p), Some(o)) = (predicted.m_u, experiment.m_u) {
        worst = worst.max((p - o).abs());
    }
    worst
}

/// Outcome of an inverse search: the recovered `(a, b, g)` (with
/// unsearched parameters held at their input value) and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseResult {
    /// Recovered albedo.
    pub a: f64,
    /// Recovered optical thickness.
    pub b: f64,
    /// Recovered anisotropy.
    pub g: f64,
    /// `|M_pred - M_obs|` (infinity norm) at the recovered point.
    pub residual: f64,
    /// Iterations spent by the search.
    pub iterations: usize,
    /// True if the search met `config.tolerance` before running out of
    /// iterations.
    pub converged: bool,
}

/// Runs the inverse search selected by `config.search`, driven by
/// whichever of `experiment.m_r/m_t/m_u` are present, and returns the
/// recovered parameters.
///
/// For [`SearchMode::Ag`], `b` is recovered directly from `M_U` via Beer's
/// law (`b = -nu0 * ln(M_U)`) before the inner `(a, g)` search runs, per
/// spec 4.9.
pub fn invert(experiment: &Experiment, config: InverseConfig, opts: ForwardOptions) -> Result<InverseResult> {
    invert_with_grid(experiment, config, opts, None)
}

/// Same as [`invert`], but lets the caller supply a prebuilt [`AGrid`] to
/// warm-start [`SearchMode::Ab`] instead of starting from `experiment.sample`.
/// Building the grid is the caller's responsibility (typically once per
/// wavelength batch sharing the same `g` and index/quadrature setup) since
/// it is far more expensive than a single inverse search.
pub fn invert_with_grid(
    experiment: &Experiment,
    config: InverseConfig,
    opts: ForwardOptions,
    grid: Option<&AGrid>,
) -> Result<InverseResult> {
    match config.search {
        SearchMode::A => invert_a(experiment, config, opts),
        SearchMode::Ab => invert_ab(experiment, config, opts, grid),
        SearchMode::Ag => invert_ag(experiment, config, opts),
        SearchMode::Abg => invert_abg(experiment, config, opts),
    }
}

fn invert_a(experiment: &Experiment, config: InverseConfig, opts: ForwardOptions) -> Result<InverseResult> {
    let m_r = experiment
        .m_r
        .ok_or_else(|| IadError::NonPhysical { detail: "a-only search requires M_R".into() })?;

    let base = experiment.sample;
    let bounds = [ParameterBound::albedo()];
    let deadline = config.max_duration.map(|d| Instant::now() + d);
    let outcome: SearchOutcome<1> = brent_minimize(
        |a| {
            let mut trial = *experiment;
            trial.sample.a = a;
            let predicted = measured_rt(&trial, opts).unwrap_or(PredictedMeasurement { m_r: Some(f64::INFINITY), m_t: None, m_u: None });
            (predicted.m_r.unwrap_or(f64::INFINITY) - m_r).abs()
        },
        bounds[0],
        config.tolerance,
        config.max_iter,
        deadline,
    );
    let outcome = check_search_outcome(outcome, &bounds)?;

    Ok(InverseResult {
        a: outcome.point[0],
        b: base.b,
        g: base.g,
        residual: outcome.residual,
        iterations: outcome.iterations,
        converged: outcome.converged,
    })
}

fn invert_ab(
    experiment: &Experiment,
    config: InverseConfig,
    opts: ForwardOptions,
    grid: Option<&AGrid>,
) -> Result<InverseResult> {
    let base = experiment.sample;
    let m_r = experiment.m_r.unwrap_or(0.0);
    let m_t = experiment.m_t.unwrap_or(0.0);

    let initial = match (config.warm_start, grid) {
        (WarmStart::Grid, Some(grid)) => {
            let (a0, b0) = grid.nearest(m_r, m_t);
            [a0, b0]
        }
        _ => [base.a, base.b.min(50.0)],
    };

    let bounds = [ParameterBound::albedo(), ParameterBound::new(0.0, base.b.max(1000.0).max(1.0))];
    let deadline = config.max_duration.map(|d| Instant::now() + d);

    let outcome = nelder_mead(
        |p: &[f64; 2]| {
            let mut trial = *experiment;
            trial.sample.a = p[0];
            trial.sample.b = p[1];
            match measured_rt(&trial, opts) {
                Ok(predicted) => residual(&predicted, &trial),
                Err(_) => f64::INFINITY,
            }
        },
        initial,
        &bounds,
        config.tolerance,
        config.max_iter,
        deadline,
    );
    let outcome = check_search_outcome(outcome, &bounds)?;

    Ok(InverseResult {
        a: outcome.point[0],
        b: outcome.point[1],
        g: base.g,
        residual: outcome.residual,
        iterations: outcome.iterations,
        converged: outcome.converged,
    })
}

fn invert_ag(experiment: &Experiment, config: InverseConfig, opts: ForwardOptions) -> Result<InverseResult> {
    let m_u = experiment
        .m_u
        .ok_or_else(|| IadError::NonPhysical { detail: "a/g search requires M_U".into() })?;
    if m_u <= 0.0 || m_u >= 1.0 {
        return Err(IadError::NonPhysical {
            detail: format!("M_U = {m_u} outside (0, 1), cannot invert Beer's law"),
        });
    }

    let base = experiment.sample;
    let recovered_b = -base.nu0 * m_u.ln();

    let bounds = [ParameterBound::albedo(), ParameterBound::anisotropy()];
    let deadline = config.max_duration.map(|d| Instant::now() + d);
    let outcome = nelder_mead(
        |p: &[f64; 2]| {
            let mut trial = *experiment;
            trial.sample.a = p[0];
            trial.sample.g = p[1];
            trial.sample.b = recovered_b;
            match measured_rt(&trial, opts) {
                Ok(predicted) => residual(&predicted, &trial),
                Err(_) => f64::INFINITY,
            }
        },
        [base.a, base.g],
        &bounds,
        config.tolerance,
        config.max_iter,
        deadline,
    );
    let outcome = check_search_outcome(outcome, &bounds)?;

    Ok(InverseResult {
        a: outcome.point[0],
        b: recovered_b,
        g: outcome.point[1],
        residual: outcome.residual,
        iterations: outcome.iterations,
        converged: outcome.converged,
    })
}

fn invert_abg(experiment: &Experiment, config: InverseConfig, opts: ForwardOptions) -> Result<InverseResult> {
    let base = experiment.sample;
    let bounds = [
        ParameterBound::albedo(),
        ParameterBound::new(0.0, base.b.max(1000.0).max(1.0)),
        ParameterBound::anisotropy(),
    ];

    let deadline = config.max_duration.map(|d| Instant::now() + d);
    let outcome = nelder_mead(
        |p: &[f64; 3]| {
            let mut trial = *experiment;
            trial.sample.a = p[0];
            trial.sample.b = p[1];
            trial.sample.g = p[2];
            match measured_rt(&trial, opts) {
                Ok(predicted) => residual(&predicted, &trial),
                Err(_) => f64::INFINITY,
            }
        },
        [base.a, base.b.min(50.0), base.g],
        &bounds,
        config.tolerance,
        config.max_iter,
        deadline,
    );
    let outcome = check_search_outcome(outcome, &bounds)?;

    Ok(InverseResult {
        a: outcome.point[0],
        b: outcome.point[1],
        g: outcome.point[2],
        residual: outcome.residual,
        iterations: outcome.iterations,
        converged: outcome.converged,
    })
}
