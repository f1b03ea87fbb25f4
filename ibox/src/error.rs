//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for `ibox`
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// Box or buffer size does not match the function's arity
    #[error("expected {expected} input intervals, got {actual}")]
    DimensionMismatch {
        /// Arity of the function
        expected: usize,
        /// Number of intervals supplied by the caller
        actual: usize,
    },

    /// Denominator interval contains zero
    #[error("denominator interval contains zero")]
    DivisionByZeroInterval,

    /// Interval bounds are reversed, NaN, or both at the same infinity
    #[error("invalid interval [{0}, {1}]")]
    InvalidInterval(f64, f64),

    /// Input interval lies entirely outside the domain of an operation
    #[error("input interval lies entirely outside the domain of `{0}`")]
    Domain(&'static str),

    /// Expression reads an input beyond the declared arity
    #[error("input index ({index}) exceeds declared arity ({arity})")]
    BadInput {
        /// Index of the input in the expression
        index: usize,
        /// Declared arity
        arity: usize,
    },

    /// Flat buffer pointer is null but its length is not zero
    #[error("null input pointer with length {0}")]
    NullPointer(usize),
}
