//! Conversion from GeoJSON DTOs to engine geometry.

use crate::geo::Point;

use super::error::GeoJsonError;
use super::types::{FeatureCollection, GeometryDto, Position};

/// Extract every line string in the collection as a `(lat, lng)` polyline.
///
/// `LineString` and `MultiLineString` geometries are read; other geometry
/// types are ignored.
pub fn polylines(collection: &FeatureCollection) -> Result<Vec<Vec<Point>>, GeoJsonError> {
    let mut lines = Vec::new();

    for (idx, feature) in collection.features.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        match geometry.kind.as_str() {
            "LineString" => {
                let coords: Vec<Position> = decode(idx, geometry)?;
                lines.push(to_points(idx, &coords)?);
            }
            "MultiLineString" => {
                let coords: Vec<Vec<Position>> = decode(idx, geometry)?;
                for line in &coords {
                    lines.push(to_points(idx, line)?);
                }
            }
            _ => {}
        }
    }

    Ok(lines)
}

/// Extract the outer ring of every polygon in the collection.
///
/// Each ring is paired with an id taken from `properties.id` (falling back
/// to the feature index). Members of a `MultiPolygon` get a `-N` suffix.
/// Holes are discarded.
pub fn outer_rings(
    collection: &FeatureCollection,
) -> Result<Vec<(String, Vec<Point>)>, GeoJsonError> {
    let mut rings = Vec::new();

    for (idx, feature) in collection.features.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let base_id = feature
            .property_id()
            .unwrap_or_else(|| format!("feature-{idx}"));

        match geometry.kind.as_str() {
            "Polygon" => {
                let coords: Vec<Vec<Position>> = decode(idx, geometry)?;
                if let Some(outer) = coords.first() {
                    rings.push((base_id, to_points(idx, outer)?));
                }
            }
            "MultiPolygon" => {
                let coords: Vec<Vec<Vec<Position>>> = decode(idx, geometry)?;
                let multi = coords.len() > 1;
                for (n, polygon) in coords.iter().enumerate() {
                    let Some(outer) = polygon.first() else {
                        continue;
                    };
                    let id = if multi {
                        format!("{base_id}-{n}")
                    } else {
                        base_id.clone()
                    };
                    rings.push((id, to_points(idx, outer)?));
                }
            }
            _ => {}
        }
    }

    Ok(rings)
}

fn decode<T: serde::de::DeserializeOwned>(
    feature: usize,
    geometry: &GeometryDto,
) -> Result<T, GeoJsonError> {
    serde_json::from_value(geometry.coordinates.clone()).map_err(|e| {
        GeoJsonError::InvalidGeometry {
            feature,
            message: format!("{}: {e}", geometry.kind),
        }
    })
}

fn to_points(feature: usize, positions: &[Position]) -> Result<Vec<Point>, GeoJsonError> {
    positions
        .iter()
        .map(|pos| match pos.as_slice() {
            [lng, lat, ..] => Ok(Point::new(*lat, *lng)),
            _ => Err(GeoJsonError::InvalidGeometry {
                feature,
                message: "position needs at least two numbers".to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson::parse_feature_collection;

    #[test]
    fn multiline_string_converts_axis_order() {
        let fc = parse_feature_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"id": 1},
                    "geometry": {
                        "type": "MultiLineString",
                        "coordinates": [
                            [[125.540, 8.964], [125.541, 8.963]],
                            [[125.530, 8.958], [125.527, 8.958, 12.0]]
                        ]
                    }
                }]
            }"#,
        )
        .unwrap();

        let lines = polylines(&fc).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][0], Point::new(8.964, 125.540));
        assert_eq!(lines[1][1], Point::new(8.958, 125.527));
    }

    #[test]
    fn line_string_and_null_geometry() {
        let fc = parse_feature_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "properties": null, "geometry": null},
                    {"type": "Feature", "geometry": {
                        "type": "LineString",
                        "coordinates": [[125.5, 8.9], [125.6, 8.95]]
                    }}
                ]
            }"#,
        )
        .unwrap();

        let lines = polylines(&fc).unwrap();
        assert_eq!(lines, vec![vec![Point::new(8.9, 125.5), Point::new(8.95, 125.6)]]);
    }

    #[test]
    fn multipolygon_outer_rings_only() {
        let fc = parse_feature_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"id": "market"},
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [
                                [[125.53, 8.94], [125.54, 8.94], [125.54, 8.95], [125.53, 8.94]],
                                [[125.535, 8.945], [125.536, 8.945], [125.536, 8.946], [125.535, 8.945]]
                            ],
                            [
                                [[125.50, 8.90], [125.51, 8.90], [125.51, 8.91], [125.50, 8.90]]
                            ]
                        ]
                    }
                }]
            }"#,
        )
        .unwrap();

        let rings = outer_rings(&fc).unwrap();
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].0, "market-0");
        assert_eq!(rings[1].0, "market-1");
        assert_eq!(rings[0].1.len(), 4);
        assert_eq!(rings[0].1[0], Point::new(8.94, 125.53));
    }

    #[test]
    fn polygon_without_id_uses_feature_index() {
        let fc = parse_feature_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[125.53, 8.94], [125.54, 8.94], [125.54, 8.95], [125.53, 8.94]]]
                    }
                }]
            }"#,
        )
        .unwrap();

        let rings = outer_rings(&fc).unwrap();
        assert_eq!(rings[0].0, "feature-0");
    }

    #[test]
    fn malformed_coordinates_are_reported() {
        let fc = parse_feature_collection(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "LineString", "coordinates": [[125.5]]}
                }]
            }"#,
        )
        .unwrap();

        let err = polylines(&fc).unwrap_err();
        assert!(matches!(err, GeoJsonError::InvalidGeometry { feature: 0, .. }));
    }
}
