use crate::models::coordinate::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;
const KM_PER_DEGREE_LAT: f64 = 111.32;

/// Degrees below which two coordinates are treated as the same place.
pub const COINCIDENT_EPSILON_DEG: f64 = 1e-6;

pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * central_angle
}

/// Flat interpolation in lat/lng space. `t` is clamped to [0, 1].
pub fn lerp(a: &Coordinate, b: &Coordinate, t: f64) -> Coordinate {
    let t = t.clamp(0.0, 1.0);
    Coordinate {
        lat: a.lat + (b.lat - a.lat) * t,
        lng: a.lng + (b.lng - a.lng) * t,
    }
}

pub fn coincident(a: &Coordinate, b: &Coordinate) -> bool {
    (a.lat - b.lat).abs() < COINCIDENT_EPSILON_DEG && (a.lng - b.lng).abs() < COINCIDENT_EPSILON_DEG
}

pub fn path_length_km(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|pair| distance_km(&pair[0], &pair[1]))
        .sum()
}

/// Moves `center` by `distance_km` along `bearing_rad` (0 = north) using a
/// local flat-earth approximation. The result stays inside the valid range.
pub fn offset_point(center: &Coordinate, bearing_rad: f64, distance_km: f64) -> Coordinate {
    let km_per_degree_lng = (KM_PER_DEGREE_LAT * center.lat.to_radians().cos()).max(0.01);

    let lat = center.lat + (distance_km * bearing_rad.cos()) / KM_PER_DEGREE_LAT;
    let lng = center.lng + (distance_km * bearing_rad.sin()) / km_per_degree_lng;

    Coordinate {
        lat: lat.clamp(-90.0, 90.0),
        lng: lng.clamp(-180.0, 180.0),
    }
}
