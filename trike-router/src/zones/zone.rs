//! Zone model: a named, coloured set of route polylines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::{self, BoundingBox, Point};

/// Zone identifier, e.g. `orange_zone_route`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier used for a zone loaded from a source of the given type.
    pub fn for_type(zone_type: &str) -> Self {
        Self(format!("{zone_type}_zone_route"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display name and map colour for a zone type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneStyle {
    pub name: String,
    pub color: String,
}

const DEFAULT_COLOR: &str = "#ea580c";

/// Styling for a zone type. Known types have fixed colours; anything else
/// gets a generated name and the default colour.
pub fn zone_style(zone_type: &str) -> ZoneStyle {
    let color = match zone_type {
        "orange" => "#ea580c",
        "red" => "#dc2626",
        "white" => "#000000",
        "green" => "#16a34a",
        _ => DEFAULT_COLOR,
    };
    ZoneStyle {
        name: format!("{} Zone Tricycle Route", capitalize(zone_type)),
        color: color.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A tricycle service zone.
///
/// Immutable once built. Reloading zone data builds new `Zone`s rather than
/// mutating these.
#[derive(Debug, Clone)]
pub struct Zone {
    id: ZoneId,
    /// Short label such as "Orange".
    label: String,
    display_name: String,
    color: String,
    polylines: Vec<Vec<Point>>,
    bounds: Option<BoundingBox>,
}

impl Zone {
    /// Build a zone. Empty polylines are dropped.
    pub fn new(
        id: ZoneId,
        label: impl Into<String>,
        display_name: impl Into<String>,
        color: impl Into<String>,
        polylines: Vec<Vec<Point>>,
    ) -> Self {
        let polylines: Vec<Vec<Point>> = polylines.into_iter().filter(|l| !l.is_empty()).collect();
        let bounds = BoundingBox::from_points(polylines.iter().flatten());
        Self {
            id,
            label: label.into(),
            display_name: display_name.into(),
            color: color.into(),
            polylines,
            bounds,
        }
    }

    /// Build a zone from its type tag using the default styling.
    pub fn from_type(zone_type: &str, polylines: Vec<Vec<Point>>) -> Self {
        let style = zone_style(zone_type);
        Self::new(
            ZoneId::for_type(zone_type),
            capitalize(zone_type),
            style.name,
            style.color,
            polylines,
        )
    }

    /// The built-in orange route used when no zone data is available.
    pub fn fallback_orange() -> Self {
        let line = [
            [125.540130448007886, 8.964374021382271],
            [125.540327462684658, 8.963585962675197],
            [125.531593145347912, 8.958857610432746],
            [125.530214042610524, 8.95806955172567],
            [125.52725882245899, 8.958397909520285],
            [125.528506582078535, 8.954785973779524],
        ]
        .into_iter()
        .map(Point::from_lng_lat)
        .collect();
        Self::from_type("orange", vec![line])
    }

    pub fn id(&self) -> &ZoneId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn polylines(&self) -> &[Vec<Point>] {
        &self.polylines
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Point> {
        self.polylines.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Shortest distance (km) from `point` to any vertex or segment of the
    /// zone. Infinite for an empty zone.
    pub fn nearest_distance(&self, point: Point) -> f64 {
        let mut best = f64::INFINITY;
        for line in &self.polylines {
            for v in line {
                best = best.min(geo::distance(point, *v));
            }
            for pair in line.windows(2) {
                best = best.min(geo::distance_to_segment(point, pair[0], pair[1]));
            }
        }
        best
    }

    /// Closest vertex to `point` and its distance (km).
    ///
    /// Returns a vertex rather than a projected point so the result can be
    /// used as a route entry anchor.
    pub fn nearest_point(&self, point: Point) -> Option<(Point, f64)> {
        self.vertices()
            .map(|v| (*v, geo::distance(point, *v)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
