//! # iad-sphere
//!
//! Integrating-sphere gain models (C8): analytic closed forms for one- and
//! two-sphere instrument configurations, plus a Monte Carlo sphere used to
//! validate the analytic forms against a first-principles photon-bounce
//! simulation.
//!
//! ## Architecture
//!
//! - **[`sphere`]**: [`sphere::Sphere`], port area-fraction bookkeeping,
//!   and the [`sphere::gain_11`]/[`sphere::gain_22`] closed forms.
//! - **[`montecarlo`]**: seeded photon-bounce simulation producing an
//!   empirical gain with a confidence interval.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod montecarlo;
pub mod sphere;

pub use montecarlo::{monte_carlo_gain, MonteCarloResult};
pub use sphere::{gain_11, gain_22, Port, Sphere, TwoSphereInputs};
