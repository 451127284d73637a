//! # iad-core
//!
//! Quadrature, Fresnel boundary physics, Henyey-Greenstein redistribution,
//! and the adding-doubling forward solver for plane-parallel turbid
//! samples.
//!
//! ## Architecture
//!
//! The forward pipeline runs in a fixed order, matching the physical
//! dependency chain of the adding-doubling method:
//!
//! - **[`quadrature`]**: Gauss/Radau/Lobatto node generation and the
//!   sample-specific rule that splits at the critical angle.
//! - **[`fresnel`]**: unpolarized reflectance, Snell refraction, and the
//!   absorbing-glass reflectance/transmittance pair.
//! - **[`redistribution`]**: delta-M-truncated Legendre or exact elliptic
//!   Henyey-Greenstein redistribution matrices.
//! - **[`start`]**: IGI and Diamond thin-layer initializers.
//! - **[`combine`]**: the add-two-layers rule and the doubling loop.
//! - **[`boundary`]**: diagonal and Snell-remapped slide boundary
//!   matrices.
//! - **[`sample`]**: the [`sample::Sample`] type and the `rt_matrices`/`rt`
//!   driver that ties the rest of the pipeline together.
//! - **[`backend`]**: the [`backend::ForwardBackend`] trait for batch
//!   (array-valued `a`/`b`/`g`) forward calls.
//! - **[`config`]**: `Default` + builder-style configuration for the
//!   forward and inverse paths.
//! - **[`error`]**: the shared error taxonomy and per-wavelength run
//!   status used across the workspace's numerical crates.
//!
//! ## Quick Start
//!
//! ```rust
//! use iad_core::sample::{forward, ForwardOptions, Sample};
//!
//! let sample = Sample {
//!     a: 0.9,
//!     b: 5.0,
//!     g: 0.8,
//!     d: 1.0,
//!     n_sample: 1.4,
//!     n_above: 1.0,
//!     n_below: 1.0,
//!     nu0: 1.0,
//!     n_quad: 8,
//! };
//!
//! let result = forward(&sample, ForwardOptions::default()).unwrap();
//! println!("UR1 = {:.4}, UT1 = {:.4}", result.ur1, result.ut1);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `parallel` | Enables [`backend::ParallelBackend`], a rayon-backed batch forward path |
//! | `serde` | Enables `Serialize`/`Deserialize` on the shared config and data-model types |

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod backend;
pub mod boundary;
pub mod combine;
pub mod config;
pub mod error;
pub mod fresnel;
pub mod math;
pub mod matrix;
pub mod quadrature;
pub mod redistribution;
pub mod sample;
pub mod start;

pub use backend::{CpuBackend, ForwardBackend};
#[cfg(feature = "parallel")]
pub use backend::ParallelBackend;
pub use config::{ForwardConfig, InverseConfig, SearchMode, WarmStart};
pub use error::{IadError, Result, RunStatus};
pub use matrix::Matrix;
pub use quadrature::QuadratureSet;
pub use redistribution::PhaseMethod;
pub use sample::{forward, rt, rt_matrices, ForwardOptions, RtMatrices, RtScalars, Sample};
pub use start::Starter;
