//! Forward- and inverse-path configuration, following the same
//! `Default` + `with_*` builder shape used throughout the optimization
//! configs this crate's approach is modeled on.

use crate::redistribution::PhaseMethod;
use crate::start::Starter;

/// Which parameters an inverse search varies, with the rest held fixed at
/// their supplied values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Vary `a` only (`M_R` present, `b`/`g` fixed).
    A,
    /// Vary `a` and `b` (`M_R` + `M_T` present, `g` fixed).
    Ab,
    /// Vary `a` and `g`, with `b` recovered directly from `M_U`.
    Ag,
    /// Vary `a`, `b`, and `g` (all three measurements present).
    Abg,
}

/// How to warm-start a two- or three-parameter inverse search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmStart {
    /// Start from the caller-supplied initial guess with no lookup.
    None,
    /// Bracket with the nearest [`crate::agrid::AGrid`] cell before
    /// refining.
    Grid,
}

impl Default for WarmStart {
    fn default() -> Self {
        Self::Grid
    }
}

/// Configuration for [`crate::sample::rt_matrices`] and
/// [`crate::sample::forward`], independent of the sample's own physical
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardConfig {
    /// Quadrature order (directions per hemisphere), `2..=32`.
    pub quadrature: u32,
    /// Phase-function redistribution method.
    pub phase: PhaseMethod,
    /// Thin-layer starter selection.
    pub starter: Starter,
    /// Optical thickness above which a slab is treated as opaque.
    pub thick_threshold: f64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            quadrature: 8,
            phase: PhaseMethod::Legendre,
            starter: Starter::Auto,
            thick_threshold: crate::math::constants::INFINITE_THICKNESS,
        }
    }
}

impl ForwardConfig {
    /// Sets the quadrature order.
    #[must_use]
    pub fn with_quadrature(mut self, n: u32) -> Self {
        self.quadrature = n;
        self
    }

    /// Sets the phase-function redistribution method.
    #[must_use]
    pub fn with_phase(mut self, phase: PhaseMethod) -> Self {
        self.phase = phase;
        self
    }

    /// Sets the thin-layer starter selection.
    #[must_use]
    pub fn with_starter(mut self, starter: Starter) -> Self {
        self.starter = starter;
        self
    }

    /// Converts to the [`crate::sample::ForwardOptions`] the forward path
    /// actually consumes. `delta_m_order` of `None` lets
    /// [`crate::sample::rt_matrices`] derive the default `2 * n_quad` rule
    /// from the sample itself.
    #[must_use]
    pub fn to_forward_options(self, delta_m_order: Option<u32>) -> crate::sample::ForwardOptions {
        crate::sample::ForwardOptions {
            phase: self.phase,
            starter: self.starter,
            delta_m_order,
        }
    }
}

/// Configuration for the inverse search (the grid warm-start and the
/// bounded/Brent search it feeds into, both implemented in `iad-inverse`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseConfig {
    /// Which parameters to vary.
    pub search: SearchMode,
    /// Convergence tolerance on `|M_pred - M_obs|` (infinity norm).
    pub tolerance: f64,
    /// Maximum number of search iterations before giving up.
    pub max_iter: usize,
    /// Warm-start strategy for multi-parameter searches.
    pub warm_start: WarmStart,
    /// AGrid dimensions `(n_a, n_b)` when `warm_start` is [`WarmStart::Grid`].
    pub grid_dims: (usize, usize),
    /// Wall-clock budget for the search, independent of `max_iter`. `None`
    /// means no deadline; the search is bounded by `max_iter` alone.
    pub max_duration: Option<std::time::Duration>,
}

impl Default for InverseConfig {
    fn default() -> Self {
        Self {
            search: SearchMode::Ab,
            tolerance: 1e-4,
            max_iter: 100,
            warm_start: WarmStart::Grid,
            grid_dims: (32, 32),
            max_duration: None,
        }
    }
}

impl InverseConfig {
    /// Sets which parameters the search varies.
    #[must_use]
    pub fn with_search(mut self, search: SearchMode) -> Self {
        self.search = search;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum iteration budget.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Disables grid warm-starting, searching from the caller's initial
    /// guess directly.
    #[must_use]
    pub fn without_warm_start(mut self) -> Self {
        self.warm_start = WarmStart::None;
        self
    }

    /// Sets a wall-clock deadline for the search, on top of `max_iter`.
    #[must_use]
    pub fn with_max_duration(mut self, max_duration: std::time::Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }
}
