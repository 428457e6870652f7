//! Fare computation with temporary adjustments.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::SharedClock;
use crate::zones::ZoneId;

use super::bracket::{FareBracket, FareTable};
use super::error::FareError;

/// Default fuel price when none is configured.
pub const DEFAULT_FUEL_PRICE: f64 = 56.0;

/// Per-distance fare rules applied on top of a bracket's base fare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FareRates {
    /// Distance covered by the base fare (km).
    pub base_distance_km: f64,
    /// Charge per started km beyond the base distance.
    pub regular_per_km: f64,
    pub discounted_per_km: f64,
}

impl Default for FareRates {
    fn default() -> Self {
        Self {
            base_distance_km: 4.0,
            regular_per_km: 1.0,
            discounted_per_km: 0.8,
        }
    }
}

impl FareRates {
    fn per_km(&self, discounted: bool) -> f64 {
        if discounted {
            self.discounted_per_km
        } else {
            self.regular_per_km
        }
    }
}

/// A temporary multiplier on base fares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareAdjustment {
    pub id: u64,
    /// Zone the adjustment is limited to; `None` applies everywhere.
    pub zone: Option<ZoneId>,
    pub multiplier: f64,
    pub expires_at: DateTime<Utc>,
}

impl FareAdjustment {
    fn applies_to(&self, zone: Option<&ZoneId>) -> bool {
        match &self.zone {
            None => true,
            Some(z) => zone == Some(z),
        }
    }
}

/// Regular and discounted fare for the same trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FareQuote {
    pub regular: f64,
    pub discounted: f64,
}

impl FareQuote {
    /// The fare a passenger with this discount status pays.
    pub fn applicable(&self, discounted: bool) -> f64 {
        if discounted {
            self.discounted
        } else {
            self.regular
        }
    }
}

/// Snapshot of the fare configuration.
#[derive(Debug, Clone, Serialize)]
pub struct FareMatrix {
    pub current_fuel_price: f64,
    pub matrix: Vec<FareBracket>,
    pub current_bracket: FareBracket,
    pub adjustments: Vec<FareAdjustment>,
}

/// Fare for `distance_km` from a bracket whose base fare has already been
/// scaled by `multiplier`.
///
/// Never below the (scaled) base fare, and non-decreasing in distance.
pub fn compute_fare(
    bracket: &FareBracket,
    rates: &FareRates,
    distance_km: f64,
    discounted: bool,
    multiplier: f64,
) -> f64 {
    let base = bracket.base_fare(discounted) * multiplier;
    let extra_km = (distance_km - rates.base_distance_km).max(0.0);
    if extra_km > 0.0 {
        base + extra_km.ceil() * rates.per_km(discounted)
    } else {
        base
    }
}

/// Resolves brackets from the current fuel price and prices trips.
pub struct FareEngine {
    table: FareTable,
    fuel_price: f64,
    rates: FareRates,
    adjustments: Vec<FareAdjustment>,
    next_adjustment_id: u64,
    clock: SharedClock,
}

impl FareEngine {
    pub fn new(table: FareTable, fuel_price: f64, clock: SharedClock) -> Result<Self, FareError> {
        validate_fuel_price(fuel_price)?;
        Ok(Self {
            table,
            fuel_price,
            rates: FareRates::default(),
            adjustments: Vec::new(),
            next_adjustment_id: 1,
            clock,
        })
    }

    pub fn with_rates(mut self, rates: FareRates) -> Self {
        self.rates = rates;
        self
    }

    pub fn table(&self) -> &FareTable {
        &self.table
    }

    pub fn fuel_price(&self) -> f64 {
        self.fuel_price
    }

    pub fn set_fuel_price(&mut self, fuel_price: f64) -> Result<(), FareError> {
        validate_fuel_price(fuel_price)?;
        info!(from = self.fuel_price, to = fuel_price, "fuel price updated");
        self.fuel_price = fuel_price;
        self.prune_expired();
        Ok(())
    }

    /// The bracket for an arbitrary fuel price.
    pub fn resolve_bracket(&self, fuel_price: f64) -> &FareBracket {
        self.table.resolve(fuel_price)
    }

    /// The bracket for the current fuel price.
    pub fn current_bracket(&self) -> &FareBracket {
        self.table.resolve(self.fuel_price)
    }

    /// Register a temporary multiplier. Without `lifetime` it lasts 24 hours.
    pub fn add_adjustment(
        &mut self,
        zone: Option<ZoneId>,
        multiplier: f64,
        lifetime: Option<Duration>,
    ) -> Result<FareAdjustment, FareError> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(FareError::InvalidMultiplier(multiplier));
        }
        let lifetime = lifetime.unwrap_or_else(|| Duration::hours(24));
        if lifetime <= Duration::zero() {
            return Err(FareError::InvalidLifetime);
        }
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(lifetime)
            .ok_or(FareError::InvalidLifetime)?;
        self.prune_expired();

        let adjustment = FareAdjustment {
            id: self.next_adjustment_id,
            zone,
            multiplier,
            expires_at,
        };
        self.next_adjustment_id += 1;
        debug!(
            id = adjustment.id,
            zone = ?adjustment.zone,
            multiplier,
            %expires_at,
            "fare adjustment added"
        );
        self.adjustments.push(adjustment.clone());
        Ok(adjustment)
    }

    pub fn clear_adjustments(&mut self) {
        self.adjustments.clear();
    }

    /// Adjustments that have not yet expired.
    pub fn active_adjustments(&self) -> Vec<FareAdjustment> {
        let now = self.clock.now();
        self.adjustments
            .iter()
            .filter(|a| a.expires_at > now)
            .cloned()
            .collect()
    }

    /// When the earliest active adjustment lapses, if any is active.
    pub fn next_expiry(&self) -> Option<DateTime<Utc>> {
        let now = self.clock.now();
        self.adjustments
            .iter()
            .map(|a| a.expires_at)
            .filter(|&t| t > now)
            .min()
    }

    /// Combined multiplier of the active adjustments that apply to `zone`.
    pub fn multiplier_for(&self, zone: Option<&ZoneId>) -> f64 {
        let now = self.clock.now();
        self.adjustments
            .iter()
            .filter(|a| a.expires_at > now && a.applies_to(zone))
            .map(|a| a.multiplier)
            .product()
    }

    /// Fare for one ride of `distance_km`, optionally within a zone.
    pub fn fare(&self, distance_km: f64, discounted: bool, zone: Option<&ZoneId>) -> f64 {
        compute_fare(
            self.current_bracket(),
            &self.rates,
            distance_km,
            discounted,
            self.multiplier_for(zone),
        )
    }

    /// Regular and discounted fare for one ride.
    pub fn quote(&self, distance_km: f64, zone: Option<&ZoneId>) -> FareQuote {
        FareQuote {
            regular: self.fare(distance_km, false, zone),
            discounted: self.fare(distance_km, true, zone),
        }
    }

    pub fn matrix(&self) -> FareMatrix {
        FareMatrix {
            current_fuel_price: self.fuel_price,
            matrix: self.table.brackets().to_vec(),
            current_bracket: *self.current_bracket(),
            adjustments: self.active_adjustments(),
        }
    }

    fn prune_expired(&mut self) {
        let now = self.clock.now();
        self.adjustments.retain(|a| a.expires_at > now);
    }
}

fn validate_fuel_price(fuel_price: f64) -> Result<(), FareError> {
    if fuel_price.is_finite() && fuel_price >= 0.0 {
        Ok(())
    } else {
        Err(FareError::InvalidFuelPrice(fuel_price))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;

    fn engine_at(fuel_price: f64) -> (FareEngine, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let engine = FareEngine::new(FareTable::butuan(), fuel_price, Arc::new(clock.clone()))
            .unwrap();
        (engine, clock)
    }

    #[test]
    fn base_fare_covers_first_four_km() {
        let (engine, _) = engine_at(DEFAULT_FUEL_PRICE);
        assert_eq!(engine.fare(0.5, false, None), 9.0);
        assert_eq!(engine.fare(4.0, false, None), 9.0);
        assert_eq!(engine.fare(4.0, true, None), 7.0);
    }

    #[test]
    fn every_started_km_beyond_base_is_charged() {
        let (engine, _) = engine_at(DEFAULT_FUEL_PRICE);
        assert_eq!(engine.fare(4.1, false, None), 10.0);
        assert_eq!(engine.fare(6.0, false, None), 11.0);
        assert!((engine.fare(6.5, true, None) - (7.0 + 3.0 * 0.8)).abs() < 1e-9);
    }

    #[test]
    fn fuel_price_above_table_uses_highest_bracket() {
        let (engine, _) = engine_at(200.0);
        let bracket = engine.resolve_bracket(200.0);
        assert_eq!(bracket, engine.table().brackets().last().unwrap());
        assert_eq!(engine.fare(4.0, false, None), bracket.regular_fare);
        assert_eq!(engine.fare(4.0, true, None), bracket.discounted_fare);
    }

    #[test]
    fn invalid_inputs_rejected() {
        let (mut engine, _) = engine_at(DEFAULT_FUEL_PRICE);
        assert!(matches!(
            engine.set_fuel_price(f64::NAN),
            Err(FareError::InvalidFuelPrice(_))
        ));
        assert_eq!(
            engine.set_fuel_price(-1.0),
            Err(FareError::InvalidFuelPrice(-1.0))
        );
        assert_eq!(engine.fuel_price(), DEFAULT_FUEL_PRICE);
        assert!(matches!(
            engine.add_adjustment(None, 0.0, None),
            Err(FareError::InvalidMultiplier(_))
        ));
    }

    #[test]
    fn adjustments_scale_base_fare_only() {
        let (mut engine, _) = engine_at(DEFAULT_FUEL_PRICE);
        engine.add_adjustment(None, 1.5, None).unwrap();

        assert_eq!(engine.fare(4.0, false, None), 13.5);
        // Distance extension is not scaled.
        assert_eq!(engine.fare(5.0, false, None), 14.5);
    }

    #[test]
    fn zone_adjustment_only_applies_to_that_zone() {
        let (mut engine, _) = engine_at(DEFAULT_FUEL_PRICE);
        let red = ZoneId::for_type("red");
        engine.add_adjustment(Some(red.clone()), 2.0, None).unwrap();

        assert_eq!(engine.fare(1.0, false, Some(&red)), 18.0);
        assert_eq!(engine.fare(1.0, false, Some(&ZoneId::for_type("green"))), 9.0);
        assert_eq!(engine.fare(1.0, false, None), 9.0);
    }

    #[test]
    fn adjustments_expire() {
        let (mut engine, clock) = engine_at(DEFAULT_FUEL_PRICE);
        engine
            .add_adjustment(None, 2.0, Some(Duration::hours(1)))
            .unwrap();
        let day_long = engine.add_adjustment(None, 1.5, None).unwrap();
        assert_eq!(engine.multiplier_for(None), 3.0);

        clock.advance(Duration::minutes(61));
        assert_eq!(engine.multiplier_for(None), 1.5);
        assert_eq!(engine.active_adjustments(), vec![day_long]);

        clock.advance(Duration::hours(24));
        assert_eq!(engine.fare(1.0, false, None), 9.0);

        // Expired entries are dropped on the next mutation.
        engine.add_adjustment(None, 1.1, None).unwrap();
        assert_eq!(engine.adjustments.len(), 1);
    }

    #[test]
    fn out_of_range_lifetime_is_an_error() {
        let (mut engine, _) = engine_at(DEFAULT_FUEL_PRICE);
        assert_eq!(
            engine.add_adjustment(None, 1.5, Some(Duration::seconds(i64::MAX / 1000))),
            Err(FareError::InvalidLifetime)
        );
        assert_eq!(
            engine.add_adjustment(None, 1.5, Some(Duration::hours(-1))),
            Err(FareError::InvalidLifetime)
        );
        assert!(engine.active_adjustments().is_empty());
    }

    #[test]
    fn next_expiry_tracks_earliest_active() {
        let (mut engine, clock) = engine_at(DEFAULT_FUEL_PRICE);
        assert_eq!(engine.next_expiry(), None);

        let short = engine
            .add_adjustment(None, 2.0, Some(Duration::minutes(10)))
            .unwrap();
        let long = engine.add_adjustment(None, 1.5, None).unwrap();
        assert_eq!(engine.next_expiry(), Some(short.expires_at));

        clock.advance(Duration::minutes(11));
        assert_eq!(engine.next_expiry(), Some(long.expires_at));
    }

    #[test]
    fn matrix_view() {
        let (mut engine, _) = engine_at(70.0);
        engine.add_adjustment(None, 1.2, None).unwrap();
        let matrix = engine.matrix();

        assert_eq!(matrix.current_fuel_price, 70.0);
        assert_eq!(matrix.matrix.len(), 6);
        assert_eq!(matrix.current_bracket.regular_fare, 10.0);
        assert_eq!(matrix.adjustments.len(), 1);
    }

    proptest! {
        #[test]
        fn fare_is_monotonic_in_distance(
            d1 in 0.0f64..30.0,
            d2 in 0.0f64..30.0,
            fuel in 0.0f64..250.0,
            discounted in any::<bool>(),
        ) {
            let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            let table = FareTable::butuan();
            let bracket = table.resolve(fuel);
            let rates = FareRates::default();
            let lo_fare = compute_fare(bracket, &rates, lo, discounted, 1.0);
            let hi_fare = compute_fare(bracket, &rates, hi, discounted, 1.0);
            prop_assert!(lo_fare <= hi_fare);
            prop_assert!(lo_fare >= bracket.base_fare(discounted));
        }

        #[test]
        fn every_price_resolves_to_a_containing_or_nearest_bracket(fuel in 0.0f64..250.0) {
            let table = FareTable::butuan();
            let bracket = table.resolve(fuel);
            let first = table.brackets()[0];
            let last = *table.brackets().last().unwrap();
            if fuel < first.fuel_price_min {
                prop_assert_eq!(*bracket, first);
            } else if fuel > last.fuel_price_max {
                prop_assert_eq!(*bracket, last);
            } else {
                prop_assert!(bracket.fuel_price_min <= fuel);
            }
        }
    }
}
