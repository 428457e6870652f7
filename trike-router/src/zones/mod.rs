//! Tricycle zones and the graphs derived from them.
//!
//! A zone is a set of route polylines. Each zone gets a segment
//! connectivity graph for reachability checks, and all zones together get a
//! transfer graph describing where passengers can walk between routes.

mod connectivity;
mod error;
mod registry;
mod source;
mod transfer;
mod zone;

pub use connectivity::{ConnectivityGraph, Segment};
pub use error::ZoneError;
pub use registry::{GraphSettings, ZoneRegistry, ZoneSnapshot};
pub use source::{load_zone_dir, load_zones_or_default};
pub use transfer::{TransferPoint, TransferSettings, ZoneTransferGraph};
pub use zone::{Zone, ZoneId, ZoneStyle, zone_style};
