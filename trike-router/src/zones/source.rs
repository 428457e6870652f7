//! Loading zone geometry from GeoJSON files.

use std::path::Path;

use tracing::{info, warn};

use crate::geojson;

use super::error::ZoneError;
use super::zone::Zone;

/// Load every `*.geojson` file in `dir` as a zone. The file stem is the zone
/// type (`orange.geojson` becomes `orange_zone_route`).
///
/// Files are read in name order. A file that fails to parse aborts the load
/// so a reload never half-applies.
pub fn load_zone_dir(dir: &Path) -> Result<Vec<Zone>, ZoneError> {
    let io_err = |source| ZoneError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().is_some_and(|ext| ext == "geojson") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut zones = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(zone_type) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let zone_type = zone_type.to_lowercase();
        let collection =
            geojson::read_feature_collection(&path).map_err(|source| ZoneError::Source {
                zone_type: zone_type.clone(),
                source,
            })?;
        let lines = geojson::polylines(&collection).map_err(|source| ZoneError::Source {
            zone_type: zone_type.clone(),
            source,
        })?;

        let zone = Zone::from_type(&zone_type, lines);
        info!(zone = %zone.id(), polylines = zone.polylines().len(), "loaded zone");
        zones.push(zone);
    }

    Ok(zones)
}

/// Load zones from `dir`, falling back to the built-in orange route when the
/// directory is missing, unreadable or empty.
pub fn load_zones_or_default(dir: &Path) -> Vec<Zone> {
    match load_zone_dir(dir) {
        Ok(zones) if !zones.is_empty() => zones,
        Ok(_) => {
            warn!(dir = %dir.display(), "no zone files found, using fallback route");
            vec![Zone::fallback_orange()]
        }
        Err(e) => {
            warn!(error = %e, "failed to load zones, using fallback route");
            vec![Zone::fallback_orange()]
        }
    }
}
