//! Curated waypoints used to steer road routes around restricted areas.

use serde::{Deserialize, Serialize};

use crate::geo::Point;

use super::checker::RestrictionChecker;

/// Which side of the restricted belt a waypoint sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    North,
    South,
}

/// A hand-placed point that road routes may be sent through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub point: Point,
    pub name: String,
    pub side: Side,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64, name: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            point: Point::new(lat, lng),
            name: name.into(),
            side,
        }
    }
}

/// A waypoint with its validation result, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct WaypointStatus {
    #[serde(flatten)]
    pub waypoint: Waypoint,
    pub safe: bool,
    /// Restricted polygon containing the waypoint, if any.
    pub inside: Option<String>,
}

/// The curated waypoints split into usable and excluded sets.
#[derive(Debug, Clone, Default)]
pub struct WaypointSet {
    usable: Vec<Waypoint>,
    excluded: Vec<(Waypoint, String)>,
}

impl WaypointSet {
    /// Drop every waypoint that lies inside a restricted polygon. Excluded
    /// waypoints are kept for diagnostics.
    pub fn validate(waypoints: Vec<Waypoint>, checker: &RestrictionChecker) -> Self {
        let mut set = Self::default();
        for wp in waypoints {
            match checker.is_inside(wp.point) {
                Some(polygon) => {
                    let polygon = polygon.to_string();
                    set.excluded.push((wp, polygon));
                }
                None => set.usable.push(wp),
            }
        }
        set
    }

    pub fn usable(&self) -> &[Waypoint] {
        &self.usable
    }

    pub fn excluded(&self) -> impl Iterator<Item = &Waypoint> {
        self.excluded.iter().map(|(wp, _)| wp)
    }

    /// Every waypoint with its safe/excluded flag, usable ones first.
    pub fn statuses(&self) -> Vec<WaypointStatus> {
        let usable = self.usable.iter().map(|wp| WaypointStatus {
            waypoint: wp.clone(),
            safe: true,
            inside: None,
        });
        let excluded = self.excluded.iter().map(|(wp, polygon)| WaypointStatus {
            waypoint: wp.clone(),
            safe: false,
            inside: Some(polygon.clone()),
        });
        usable.chain(excluded).collect()
    }
}

/// The Butuan City gap waypoints north and south of the restricted belt.
pub fn curated_waypoints() -> Vec<Waypoint> {
    use Side::{North, South};

    vec![
        Waypoint::new("N1", 8.948823, 125.530714, "North Gap 1 (west)", North),
        Waypoint::new("N2", 8.950436, 125.534950, "North Gap 2 (mid)", North),
        Waypoint::new("N3", 8.950918, 125.540935, "North Gap 3 (east)", North),
        Waypoint::new("N4", 8.958513, 125.527187, "North Gap SUB 1 (East)", North),
        Waypoint::new("N5", 8.948280, 125.546785, "North Gap mid 1 (mid)", North),
        Waypoint::new("N6", 8.949248203494681, 125.54365235221756, "North Gap mid 2 (mid)", North),
        Waypoint::new("N7", 8.951750, 125.537656, "North Gap mid 3 (mid)", North),
        Waypoint::new("N10", 8.948201, 125.542222, "North Gap sub 6 (west)", North),
        Waypoint::new("N8", 8.956175, 125.504998, "North Gap mid 4 (mid)", North),
        Waypoint::new("N9", 8.960337, 125.515402, "North Gap sub 5 (west)", North),
        Waypoint::new("N11", 8.948635, 125.502378, "North Gap mid 11 (mid)", North),
        Waypoint::new("N12", 8.947477, 125.543557, "North Gap mid 12 (mid)", North),
        Waypoint::new("N13", 8.945881, 125.500538, "North Gap mid 13 (mid)", North),
        Waypoint::new("N14", 8.950832, 125.542432, "North Gap mid 14 (mid)", North),
        Waypoint::new("N15", 8.951813, 125.502273, "North Gap mid 15 (mid)", North),
        Waypoint::new("N16", 8.955031, 125.536584, "North Gap mid 16 (mid)", North),
        Waypoint::new("N17", 8.952008, 125.506684, "North Gap mid 17 (mid)", North),
        Waypoint::new("N18", 8.950440, 125.511560, "North Gap mid 18 (mid)", North),
        Waypoint::new("N19", 8.947711, 125.504796, "North Gap mid 19 (mid)", North),
        Waypoint::new("S1", 8.941320, 125.533488, "South Gap 1 (west)", South),
        Waypoint::new("S2", 8.943665, 125.537128, "South Gap 2 (mid)", South),
        Waypoint::new("S3", 8.944648, 125.540361, "South Gap 3 (east)", South),
        Waypoint::new("S4", 8.940970, 125.532428, "South Gap sub 4 (east)", South),
        Waypoint::new("S5", 8.945942, 125.544160, "South Gap sub 5 (east)", South),
        Waypoint::new("S6", 8.940305, 125.525923, "South Gap sub 6 (west)", South),
        Waypoint::new("S9", 8.947525, 125.552867, "South Gap sub 9 (east)", South),
        Waypoint::new("S8", 8.935942, 125.555209, "South Gap sub 8 (east)", South),
        Waypoint::new("S7", 8.927561, 125.557032, "South Gap sub 7 (west)", South),
        Waypoint::new("S10", 8.931793, 125.548944, "South Gap sub 10 (east)", South),
        Waypoint::new("S11", 8.919436, 125.551529, "South Gap sub 11 (east)", South),
        Waypoint::new("S12", 8.925532, 125.539604, "South Gap sub 12 (west)", South),
        Waypoint::new("S24", 8.944680, 125.543367, "South Gap sub 24 (west)", South),
        Waypoint::new("S20", 8.909333, 125.545842, "South Gap sub 20 (east)", South),
        Waypoint::new("S13", 8.903923, 125.554850, "South Gap sub 13 (east)", South),
        Waypoint::new("S14", 8.914116, 125.561223, "South Gap sub 14 (east)", South),
        Waypoint::new("S15", 8.914956, 125.566260, "South Gap sub 15 (east)", South),
        Waypoint::new("S16", 8.930484, 125.560737, "South Gap sub 16 (east)", South),
        Waypoint::new("S17", 8.903851, 125.562948, "South Gap sub 17 (east)", South),
        Waypoint::new("S18", 8.893598, 125.557847, "South Gap sub 18 (east)", South),
        Waypoint::new("S19", 8.939874, 125.522571, "South Gap sub 19 (east)", South),
        Waypoint::new("S21", 8.938498, 125.539557, "South Gap sub 21 (east)", South),
        Waypoint::new("S22", 8.921951, 125.558273, "South Gap sub 22 (east)", South),
        Waypoint::new("S23", 8.924467, 125.562108, "South Gap sub 23 (east)", South),
    ]
}
