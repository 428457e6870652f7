//! GeoJSON DTOs.
//!
//! Only the parts of the format the engine reads are modelled. Geometry
//! coordinates stay as raw JSON until conversion, since their nesting
//! depends on the geometry type.

use serde::{Deserialize, Serialize};

/// A GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_tag")]
    pub kind: String,

    #[serde(default)]
    pub features: Vec<Feature>,
}

fn feature_collection_tag() -> String {
    "FeatureCollection".to_string()
}

/// A single GeoJSON feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Free-form properties; `id` is read when present.
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,

    /// Features with a null geometry are skipped.
    pub geometry: Option<GeometryDto>,
}

impl Feature {
    /// The feature's `properties.id` rendered as a string, if any.
    pub fn property_id(&self) -> Option<String> {
        let value = self.properties.as_ref()?.get("id")?;
        match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A geometry with type tag and untyped coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryDto {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub coordinates: serde_json::Value,
}

/// A GeoJSON position: `[lng, lat]` with an optional altitude.
pub(crate) type Position = Vec<f64>;
