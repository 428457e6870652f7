//! Zone error types.

use crate::geojson::GeoJsonError;

use super::zone::ZoneId;

/// Errors looking up or loading zones.
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    /// No zone with this identifier in the current snapshot
    #[error("unknown zone: {0}")]
    UnknownZone(ZoneId),

    /// Zone directory could not be listed
    #[error("failed to read zone directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A zone file could not be parsed
    #[error("invalid zone file for {zone_type}: {source}")]
    Source {
        zone_type: String,
        #[source]
        source: GeoJsonError,
    },
}
