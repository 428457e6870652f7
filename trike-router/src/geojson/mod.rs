//! GeoJSON source documents.
//!
//! Zone geometry arrives as `LineString`/`MultiLineString` features and
//! restricted areas as `Polygon`/`MultiPolygon` features, both in GeoJSON
//! `[lng, lat]` axis order. This module deserializes those documents and
//! converts them to internal `(lat, lng)` points.

mod convert;
mod error;
mod types;

pub use convert::{outer_rings, polylines};
pub use error::GeoJsonError;
pub use types::{Feature, FeatureCollection, GeometryDto};

/// Parse a GeoJSON `FeatureCollection` from a string.
pub fn parse_feature_collection(json: &str) -> Result<FeatureCollection, GeoJsonError> {
    serde_json::from_str(json).map_err(GeoJsonError::Json)
}

/// Read and parse a GeoJSON `FeatureCollection` from disk.
pub fn read_feature_collection(
    path: impl AsRef<std::path::Path>,
) -> Result<FeatureCollection, GeoJsonError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| GeoJsonError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_feature_collection(&json)
}
