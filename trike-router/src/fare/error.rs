//! Fare error types.

/// Errors building a fare table or registering an adjustment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FareError {
    #[error("fare table has no brackets")]
    EmptyTable,

    #[error("bracket {index} has min {min} above max {max}")]
    InvertedBracket { index: usize, min: f64, max: f64 },

    #[error("bracket {index} overlaps or precedes the bracket before it")]
    OverlappingBrackets { index: usize },

    #[error("bracket {index} has a negative or non-finite fare")]
    InvalidFare { index: usize },

    #[error("fuel price must be a finite, non-negative number (got {0})")]
    InvalidFuelPrice(f64),

    #[error("adjustment multiplier must be positive and finite (got {0})")]
    InvalidMultiplier(f64),

    #[error("adjustment lifetime is out of range")]
    InvalidLifetime,
}
