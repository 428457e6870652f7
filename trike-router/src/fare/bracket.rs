//! Fuel-price fare brackets.

use serde::{Deserialize, Serialize};

use super::error::FareError;

/// Base fares for one fuel-price range. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FareBracket {
    pub fuel_price_min: f64,
    pub fuel_price_max: f64,
    pub regular_fare: f64,
    pub discounted_fare: f64,
}

impl FareBracket {
    pub const fn new(
        fuel_price_min: f64,
        fuel_price_max: f64,
        regular_fare: f64,
        discounted_fare: f64,
    ) -> Self {
        Self {
            fuel_price_min,
            fuel_price_max,
            regular_fare,
            discounted_fare,
        }
    }

    pub fn contains(&self, fuel_price: f64) -> bool {
        fuel_price >= self.fuel_price_min && fuel_price <= self.fuel_price_max
    }

    pub fn base_fare(&self, discounted: bool) -> f64 {
        if discounted {
            self.discounted_fare
        } else {
            self.regular_fare
        }
    }
}

/// An ordered, non-overlapping list of fare brackets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FareTable {
    brackets: Vec<FareBracket>,
}

impl FareTable {
    /// Validate and wrap a bracket list.
    ///
    /// Brackets must be given in ascending order, each starting strictly
    /// after the previous one ends.
    pub fn new(brackets: Vec<FareBracket>) -> Result<Self, FareError> {
        if brackets.is_empty() {
            return Err(FareError::EmptyTable);
        }
        for (index, b) in brackets.iter().enumerate() {
            let ordered = b.fuel_price_min <= b.fuel_price_max;
            if !ordered {
                return Err(FareError::InvertedBracket {
                    index,
                    min: b.fuel_price_min,
                    max: b.fuel_price_max,
                });
            }
            let fares_ok = [b.regular_fare, b.discounted_fare]
                .iter()
                .all(|f| f.is_finite() && *f >= 0.0);
            if !fares_ok {
                return Err(FareError::InvalidFare { index });
            }
        }
        for (i, pair) in brackets.windows(2).enumerate() {
            if pair[1].fuel_price_min <= pair[0].fuel_price_max {
                return Err(FareError::OverlappingBrackets { index: i + 1 });
            }
        }
        Ok(Self { brackets })
    }

    /// The official Butuan City tricycle fare matrix.
    pub fn butuan() -> Self {
        Self {
            brackets: vec![
                FareBracket::new(45.0, 55.0, 8.0, 6.0),
                FareBracket::new(56.0, 65.0, 9.0, 7.0),
                FareBracket::new(66.0, 75.0, 10.0, 8.0),
                FareBracket::new(76.0, 85.0, 11.0, 9.0),
                FareBracket::new(86.0, 95.0, 12.0, 10.0),
                FareBracket::new(96.0, 105.0, 13.0, 11.0),
            ],
        }
    }

    pub fn brackets(&self) -> &[FareBracket] {
        &self.brackets
    }

    /// The bracket applying at `fuel_price`.
    ///
    /// Prices below the table use the first bracket and prices above it use
    /// the last. A price falling in a gap between brackets uses the lower
    /// one. Every price maps to exactly one bracket.
    pub fn resolve(&self, fuel_price: f64) -> &FareBracket {
        let idx = self
            .brackets
            .partition_point(|b| b.fuel_price_min <= fuel_price);
        // `new` guarantees at least one bracket.
        &self.brackets[idx.saturating_sub(1)]
    }
}

impl Default for FareTable {
    fn default() -> Self {
        Self::butuan()
    }
}

impl<'de> Deserialize<'de> for FareTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let brackets = Vec::<FareBracket>::deserialize(deserializer)?;
        Self::new(brackets).map_err(serde::de::Error::custom)
    }
}
