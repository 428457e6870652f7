//! Distance and intersection math.
//!
//! Segment projection and intersection tests work in a local planar frame;
//! at city scale the error against true geodesics is far below the
//! thresholds the engine uses.

use super::point::Point;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude on the same sphere as [`distance`].
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Great-circle (haversine) distance between two points, in kilometres.
pub fn distance(a: Point, b: Point) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt())
}

/// Distance from `p` to the segment `a`-`b`, in kilometres.
///
/// The projection parameter is clamped to `[0, 1]`. A degenerate segment
/// (`a == b`) is plain point distance. The result never exceeds the distance
/// to either endpoint.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let to_a = distance(p, a);
    let to_b = distance(p, b);

    // Longitude is scaled by cos(lat) so the projection is roughly isotropic.
    let scale = ((a.lat + b.lat) / 2.0).to_radians().cos();
    let cx = (b.lng - a.lng) * scale;
    let cy = b.lat - a.lat;
    let len_sq = cx * cx + cy * cy;
    if len_sq == 0.0 {
        return to_a;
    }

    let px = (p.lng - a.lng) * scale;
    let py = p.lat - a.lat;
    let t = ((px * cx + py * cy) / len_sq).clamp(0.0, 1.0);

    let projected = Point::new(a.lat + t * (b.lat - a.lat), a.lng + t * (b.lng - a.lng));
    distance(p, projected).min(to_a).min(to_b)
}

/// Ray-casting parity test. The ring may be explicitly closed or not.
pub fn point_in_polygon(p: Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (vi, vj) = (ring[i], ring[j]);
        if (vi.lng > p.lng) != (vj.lng > p.lng)
            && p.lat < (vj.lat - vi.lat) * (p.lng - vi.lng) / (vj.lng - vi.lng) + vi.lat
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Parametric intersection test for segments `p1`-`p2` and `p3`-`p4`.
///
/// Parallel (including collinear) segments never intersect.
pub fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let (x1, y1) = (p1.lat, p1.lng);
    let (x2, y2) = (p2.lat, p2.lng);
    let (x3, y3) = (p3.lat, p3.lng);
    let (x4, y4) = (p4.lat, p4.lng);

    let denom = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);
    if denom == 0.0 {
        return false;
    }

    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / denom;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / denom;

    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// True if either endpoint lies inside the ring or the segment crosses any
/// ring edge (including the implicit closing edge).
pub fn segment_intersects_polygon(p1: Point, p2: Point, ring: &[Point]) -> bool {
    if point_in_polygon(p1, ring) || point_in_polygon(p2, ring) {
        return true;
    }

    let crosses_edge = ring
        .windows(2)
        .any(|edge| segments_intersect(p1, p2, edge[0], edge[1]));
    if crosses_edge {
        return true;
    }

    match (ring.first(), ring.last()) {
        (Some(&first), Some(&last)) if ring.len() > 2 && first != last => {
            segments_intersect(p1, p2, last, first)
        }
        _ => false,
    }
}

/// The point `km` away from `origin` along `bearing` radians (0 = north,
/// clockwise), using a local flat-earth approximation.
pub fn offset_km(origin: Point, km: f64, bearing: f64) -> Point {
    let dlat = km * bearing.cos() / KM_PER_DEGREE;
    let lat_scale = origin.lat.to_radians().cos().abs().max(1e-6);
    let dlng = km * bearing.sin() / (KM_PER_DEGREE * lat_scale);
    Point::new(origin.lat + dlat, origin.lng + dlng)
}
