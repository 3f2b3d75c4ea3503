use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for construction and validation failures.
///
/// Coordinator outcomes are not reported through this type: an infeasible
/// state change is ordinary data (see [`crate::state::Rejection`]). This enum
/// covers misconfiguration and numeric pathologies that make an object
/// impossible to build.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Numerical or geometric issue (e.g., coincident particle centers, degenerate mapping).
    #[error("numerical error: {0}")]
    MathError(String),

    /// A quantity fell outside the domain it is allowed to occupy.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
}
