//! GeoJSON error types.

/// Errors reading or interpreting GeoJSON source data.
#[derive(Debug, thiserror::Error)]
pub enum GeoJsonError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid JSON or not a FeatureCollection
    #[error("JSON parse error: {0}")]
    Json(#[source] serde_json::Error),

    /// A feature's geometry has the wrong shape for its declared type
    #[error("invalid geometry in feature {feature}: {message}")]
    InvalidGeometry { feature: usize, message: String },
}
