//! Error taxonomy for the adding-doubling engine.
//!
//! One flat enum, a hand-written [`std::fmt::Display`], and a type alias —
//! no `thiserror`. Parameter errors are meant to surface immediately at the
//! call site; [`IadError::Singular`] and friends are recoverable by the
//! caller (the combine step tries a regularized solve before giving up).

use std::fmt;

/// Errors raised by the quadrature, Fresnel, redistribution, combine, and
/// sample driver modules.
#[derive(Debug, Clone, PartialEq)]
pub enum IadError {
    /// A physical parameter was outside its valid domain.
    ParamOutOfRange {
        /// Name of the offending parameter (e.g. `"a"`, `"g"`, `"N"`).
        param: &'static str,
        /// The value that was rejected, formatted for display.
        value: String,
        /// Human-readable description of the valid range.
        expected: &'static str,
    },
    /// Newton iteration for a Gauss/Radau/Lobatto node failed to converge.
    ///
    /// Never observed in practice for `N` in the documented range; treated
    /// as fatal rather than recoverable.
    QuadratureConvergence {
        /// Which quadrature rule failed (`"gauss"`, `"radau"`, `"lobatto"`).
        rule: &'static str,
        /// Node index that failed to converge.
        index: usize,
    },
    /// A linear solve in the layer-add step hit a near-singular matrix.
    Singular {
        /// Description of which solve failed and why.
        detail: String,
    },
    /// An inverse-search target lies outside the physically achievable
    /// region of the forward map.
    NonPhysical {
        /// Description of which measurement was unreachable.
        detail: String,
    },
    /// The inverse search exhausted its iteration budget without meeting
    /// tolerance.
    SearchNoConverge {
        /// Iterations actually performed.
        iterations: usize,
        /// Residual `|M_pred - M_obs|` at the best point found.
        residual: f64,
    },
    /// The inverse search exceeded its wall-clock budget.
    Timeout {
        /// Iterations performed before the deadline.
        iterations: usize,
    },
    /// An I/O error surfaced while the CLI's `.rxt`/`.txt` adapters were
    /// reading or writing a file. Never raised from the numerical core.
    IoError(String),
    /// A parse error surfaced while the CLI's `.rxt` adapter was reading an
    /// instrument descriptor. Never raised from the numerical core.
    ParseError(String),
}

impl fmt::Display for IadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParamOutOfRange { param, value, expected } => {
                write!(f, "parameter '{param}' = {value} out of range: expected {expected}")
            }
            Self::QuadratureConvergence { rule, index } => {
                write!(f, "{rule} quadrature failed to converge at node {index}")
            }
            Self::Singular { detail } => write!(f, "singular matrix: {detail}"),
            Self::NonPhysical { detail } => write!(f, "non-physical target: {detail}"),
            Self::SearchNoConverge { iterations, residual } => write!(
                f,
                "search did not converge after {iterations} iterations (residual = {residual:.3e})"
            ),
            Self::Timeout { iterations } => {
                write!(f, "search timed out after {iterations} iterations")
            }
            Self::IoError(msg) => write!(f, "I/O error: {msg}"),
            Self::ParseError(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for IadError {}

/// Convenience alias used across the workspace's numerical crates.
pub type Result<T> = std::result::Result<T, IadError>;

/// Per-wavelength run status, mirroring the `*`/`?`/`!` status column in
/// the output table (success / warning / failure).
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Converged cleanly.
    Success,
    /// Completed, but with one or more non-fatal warnings (e.g. a
    /// regularized solve was needed, or the search hit its iteration
    /// budget but was still within a relaxed tolerance).
    Warning(Vec<String>),
    /// Failed outright; carries the error that aborted this wavelength.
    Failure(IadError),
}

impl RunStatus {
    /// The single status character written to the `.txt` result table.
    #[must_use]
    pub fn code(&self) -> char {
        match self {
            Self::Success => '*',
            Self::Warning(_) => '?',
            Self::Failure(_) => '!',
        }
    }

    /// True if this wavelength produced usable output (success or warning).
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Failure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_spec() {
        assert_eq!(RunStatus::Success.code(), '*');
        assert_eq!(RunStatus::Warning(vec!["regularized solve".into()]).code(), '?');
        assert_eq!(
            RunStatus::Failure(IadError::Timeout { iterations: 10 }).code(),
            '!'
        );
    }

    #[test]
    fn display_is_human_readable() {
        let e = IadError::ParamOutOfRange {
            param: "a",
            value: "1.5".into(),
            expected: "[0, 1]",
        };
        assert_eq!(e.to_string(), "parameter 'a' = 1.5 out of range: expected [0, 1]");
    }
}
