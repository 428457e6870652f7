//! Geographic primitives and pure distance/intersection math.
//!
//! All distances returned by this module are kilometres. Coordinates are
//! degrees, stored as (latitude, longitude).

mod math;
mod point;

pub use math::{
    EARTH_RADIUS_KM, KM_PER_DEGREE, distance, distance_to_segment, offset_km, point_in_polygon,
    segment_intersects_polygon, segments_intersect,
};
pub use point::{BoundingBox, CoordKey, Point};
