//! Curated city landmarks, searchable by name.
//!
//! Clients turn a typed query into trip endpoints by picking one of these.

use serde::Serialize;

use crate::geo::Point;

/// A named landmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    #[serde(flatten)]
    pub point: Point,
}

impl Place {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            point: Point::new(lat, lng),
        }
    }
}

/// Landmark lookup by case-insensitive name substring.
#[derive(Debug, Clone, Default)]
pub struct Places {
    places: Vec<Place>,
    /// Lowercased names, parallel to `places`.
    folded: Vec<String>,
}

impl Places {
    pub fn new(places: Vec<Place>) -> Self {
        let folded = places.iter().map(|p| p.name.to_lowercase()).collect();
        Self { places, folded }
    }

    /// Landmarks around Butuan City.
    pub fn butuan() -> Self {
        Self::new(vec![
            Place::new("Butuan City Hall", 8.953775339827885, 125.52922189368539),
            Place::new("Robinsons Place Butuan", 8.9587, 125.5439),
            Place::new("Gaisano Grand Mall Butuan", 8.9534, 125.5387),
            Place::new("Butuan Airport", 8.9514, 125.4789),
            Place::new("Butuan Port", 8.9445, 125.5523),
            Place::new("Butuan National Museum", 8.9489, 125.5425),
            Place::new("Guingona Park", 8.947790666935324, 125.5433043032038),
            Place::new("Butuan Central Elementary School", 8.9478, 125.5398),
            Place::new("Father Saturnino Urios University", 8.9523, 125.5445),
            Place::new("Butuan Medical City", 8.9456, 125.5389),
            Place::new("SM City Butuan", 8.9612, 125.5456),
            Place::new("Liberty Shrine", 8.9567, 125.5423),
            Place::new("Banza Church", 8.9534, 125.5367),
            Place::new("Butuan Bridge", 8.9489, 125.5478),
            Place::new("RTR Plaza", 8.9487, 125.5421),
        ])
    }

    pub fn all(&self) -> &[Place] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Places whose name contains `query`, ignoring case, in table order.
    ///
    /// A blank query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Place> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.places
            .iter()
            .zip(&self.folded)
            .filter(|(_, name)| name.contains(&query))
            .map(|(place, _)| place)
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<'a>(found: &[&'a Place]) -> Vec<&'a str> {
        found.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn search_ignores_case() {
        let places = Places::butuan();
        assert_eq!(names(&places.search("guingona", 10)), vec!["Guingona Park"]);
        assert_eq!(names(&places.search("SM CITY", 10)), vec!["SM City Butuan"]);
    }

    #[test]
    fn search_matches_substrings_in_table_order() {
        let places = Places::butuan();
        let found = places.search("butuan", 50);

        assert_eq!(found.len(), 10);
        assert_eq!(found[0].name, "Butuan City Hall");
        assert!(found.iter().all(|p| p.name.to_lowercase().contains("butuan")));
    }

    #[test]
    fn search_respects_limit() {
        let places = Places::butuan();
        assert_eq!(places.search("butuan", 3).len(), 3);
        assert!(places.search("butuan", 0).is_empty());
    }

    #[test]
    fn blank_or_unknown_query_finds_nothing() {
        let places = Places::butuan();
        assert!(places.search("", 10).is_empty());
        assert!(places.search("   ", 10).is_empty());
        assert!(places.search("cebu", 10).is_empty());
    }

    #[test]
    fn query_is_trimmed() {
        let places = Places::butuan();
        assert_eq!(names(&places.search("  rtr ", 10)), vec!["RTR Plaza"]);
    }

    #[test]
    fn places_serialize_flat() {
        let place = Place::new("Banza Church", 8.9534, 125.5367);
        let json = serde_json::to_value(&place).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Banza Church", "lat": 8.9534, "lng": 125.5367})
        );
    }
}
