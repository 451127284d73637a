//! Backend abstraction for batch forward passes.
//!
//! Mirrors the shape of a color-operations backend trait: a small trait
//! object abstracts over how a batch of samples gets mapped across
//! `forward`, so callers can swap in a parallel implementation without
//! touching [`crate::sample`] itself.
//!
//! # Examples
//!
//! ```
//! use iad_core::backend::{ForwardBackend, CpuBackend};
//! use iad_core::sample::{Sample, ForwardOptions};
//!
//! let backend = CpuBackend;
//! let samples = vec![Sample {
//!     a: 0.9, b: 5.0, g: 0.8, d: 1.0,
//!     n_sample: 1.4, n_above: 1.0, n_below: 1.0,
//!     nu0: 1.0, n_quad: 8,
//! }];
//! let results = backend.forward_batch(&samples, ForwardOptions::default());
//! assert_eq!(results.len(), 1);
//! ```

use crate::error::Result;
use crate::sample::{forward, ForwardOptions, RtScalars, Sample};

/// Executes a batch of forward passes. Implementations decide how the
/// batch is scheduled (sequential, thread pool, ...); every sample is
/// independent, so no implementation needs to share mutable state across
/// array elements.
pub trait ForwardBackend: Send + Sync {
    /// Backend identifier for diagnostics.
    fn name(&self) -> &str;

    /// Runs [`crate::sample::forward`] over every sample in `samples`,
    /// preserving input order in the returned vector (spec 5's ordering
    /// requirement for forward batch calls).
    fn forward_batch(&self, samples: &[Sample], opts: ForwardOptions) -> Vec<Result<RtScalars>>;
}

/// Sequential backend: one sample after another on the calling thread.
/// The default for single-sample calls and for builds without the
/// `parallel` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl ForwardBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn forward_batch(&self, samples: &[Sample], opts: ForwardOptions) -> Vec<Result<RtScalars>> {
        samples.iter().map(|s| forward(s, opts)).collect()
    }
}

#[cfg(feature = "parallel")]
mod parallel_impl {
    use super::{forward, ForwardBackend, ForwardOptions, Result, RtScalars, Sample};
    use rayon::prelude::*;

    /// Rayon-backed backend: fans out each sample in the batch to the
    /// global thread pool. Only available with the `parallel` feature,
    /// matching spec section 5's "embarrassingly parallel batch" note —
    /// each task reads its own `Sample` and shares nothing mutable.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ParallelBackend;

    impl ForwardBackend for ParallelBackend {
        fn name(&self) -> &str {
            "rayon"
        }

        fn forward_batch(&self, samples: &[Sample], opts: ForwardOptions) -> Vec<Result<RtScalars>> {
            samples.par_iter().map(|s| forward(s, opts)).collect()
        }
    }
}

#[cfg(feature = "parallel")]
pub use parallel_impl::ParallelBackend;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(b: f64) -> Sample {
        Sample {
            a: 0.8,
            b,
            g: 0.5,
            d: 1.0,
            n_sample: 1.4,
            n_above: 1.0,
            n_below: 1.0,
            nu0: 1.0,
            n_quad: 8,
        }
    }

    #[test]
    fn cpu_backend_preserves_order() {
        let samples = vec![sample(1.0), sample(5.0), sample(20.0)];
        let results = CpuBackend.forward_batch(&samples, ForwardOptions::default());
        assert_eq!(results.len(), 3);
        for r in &results {
            assert!(r.is_ok());
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_backend_matches_sequential() {
        let samples: Vec<Sample> = (1..=6).map(|i| sample(i as f64)).collect();
        let seq = CpuBackend.forward_batch(&samples, ForwardOptions::default());
        let par = ParallelBackend.forward_batch(&samples, ForwardOptions::default());
        for (a, b) in seq.iter().zip(par.iter()) {
            let a = a.as_ref().unwrap();
            let b = b.as_ref().unwrap();
            assert!((a.ur1 - b.ur1).abs() < 1e-12);
            assert!((a.ut1 - b.ut1).abs() < 1e-12);
        }
    }
}
