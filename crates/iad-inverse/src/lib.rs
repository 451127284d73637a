//! # iad-inverse
//!
//! Measurement prediction and nonlinear inverse search (C9, C10):
//! recovers `(a, b, g)` from an integrating-sphere-coupled measurement
//! triplet `(M_R, M_T, M_U)`.
//!
//! ## Architecture
//!
//! - **[`experiment`]**: [`experiment::Experiment`], the forward
//!   [`experiment::measured_rt`] predictor, and [`experiment::invert`]'s
//!   decision tree over which parameters to search.
//! - **[`search`]**: Brent's method and a bounded Nelder-Mead simplex.
//! - **[`bounds`]**: [`bounds::ParameterBound`] clamping for physical
//!   parameter ranges.
//! - **[`agrid`]**: the precomputed `(a, b)` grid used to warm-start
//!   two-parameter searches.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod agrid;
pub mod bounds;
pub mod experiment;
pub mod search;

pub use agrid::AGrid;
pub use bounds::ParameterBound;
pub use experiment::{invert, invert_with_grid, measured_rt, Experiment, InverseResult, PredictedMeasurement, SphereConfig};
pub use search::{brent_minimize, nelder_mead, SearchOutcome};
