//! Tricycle fares.
//!
//! Base fares come from a regulated table keyed by fuel price. Trips longer
//! than the base distance pay a per-km surcharge, and operators can apply
//! temporary multipliers to base fares, globally or per zone.

mod bracket;
mod engine;
mod error;

pub use bracket::{FareBracket, FareTable};
pub use engine::{
    DEFAULT_FUEL_PRICE, FareAdjustment, FareEngine, FareMatrix, FareQuote, FareRates, compute_fare,
};
pub use error::FareError;
