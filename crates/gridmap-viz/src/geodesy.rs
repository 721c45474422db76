//! Geographic coordinates and the small set of geodesy formulas the layout uses.
//!
//! Two families of formulas coexist:
//!
//! - **Local equirectangular** ([`planar_distance`], [`planar_bearing`],
//!   [`destination`]): a flat projection centred on the latitude of the
//!   starting point. Path lengths and point projection along a path use it, so
//!   that `destination(a, planar_distance(a, b) * t, planar_bearing(a, b))`
//!   lands exactly on the straight `a -> b` segment of the rendered map.
//! - **Spherical** ([`geodesic_distance`], [`great_circle_bearing`],
//!   [`rhumb_bearing`]): `geo`'s haversine and rhumb metric spaces, used for
//!   proximity factors and for [`map_angle`], the bearing that drives arrow
//!   and label rotation.
//!
//! Bearings are degrees clockwise from north in (-180, 180].

use geo::{Bearing, Distance, Haversine, Point, Rhumb};
use gridmap_core::{Degrees, Meters};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, PI};

/// Mean earth radius in meters, the radius `geo`'s haversine uses.
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Weight of the rhumb-line bearing in [`map_angle`]; the rest goes to the
/// great-circle bearing.
const RHUMB_WEIGHT: f64 = 0.1;

/// Web-mercator world size in pixels at zoom 0.
const TILE_SIZE: f64 = 512.0;

/// A (longitude, latitude) pair in degrees.
///
/// `(0, 0)` is reserved: it means "position unknown" and must never be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    /// Sentinel for an unknown position.
    pub const UNKNOWN: Self = Self { lon: 0.0, lat: 0.0 };

    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_unknown(self) -> bool {
        self.lon == 0.0 && self.lat == 0.0
    }

    /// Whether both components are inside their valid ranges.
    pub fn is_valid(self) -> bool {
        (-180.0..=180.0).contains(&self.lon) && (-90.0..=90.0).contains(&self.lat)
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lon, c.lat)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lon, self.lat)
    }
}

/// Longitude difference `to - from` in radians, wrapped to the shorter way
/// around the antimeridian.
fn delta_lon(from: Coordinate, to: Coordinate) -> f64 {
    let mut d = (to.lon - from.lon).to_radians();
    if d > PI {
        d -= 2.0 * PI;
    } else if d < -PI {
        d += 2.0 * PI;
    }
    d
}

fn wrap_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Segment length in a local equirectangular projection centred on `from`'s latitude.
pub fn planar_distance(from: Coordinate, to: Coordinate) -> Meters {
    let dx = delta_lon(from, to) * from.lat.to_radians().cos();
    let dy = (to.lat - from.lat).to_radians();
    Meters(dx.hypot(dy) * EARTH_RADIUS)
}

/// Bearing of `from -> to` in the same local projection as [`planar_distance`].
pub fn planar_bearing(from: Coordinate, to: Coordinate) -> Degrees {
    let dx = delta_lon(from, to) * from.lat.to_radians().cos();
    let dy = (to.lat - from.lat).to_radians();
    Degrees(dx.atan2(dy).to_degrees())
}

/// Point reached from `origin` after `distance` along `bearing`, in the local
/// projection centred on `origin`. Negative distances walk backwards.
pub fn destination(origin: Coordinate, distance: Meters, bearing: Degrees) -> Coordinate {
    let theta = bearing.to_radians();
    let angular = distance.value() / EARTH_RADIUS;
    let lat = origin.lat + (angular * theta.cos()).to_degrees();
    let cos_lat = origin.lat.to_radians().cos();
    let lon = if cos_lat.abs() < 1e-12 {
        origin.lon
    } else {
        origin.lon + (angular * theta.sin() / cos_lat).to_degrees()
    };
    Coordinate::new(wrap_lon(lon), lat)
}

/// Haversine distance.
pub fn geodesic_distance(from: Coordinate, to: Coordinate) -> Meters {
    Meters(Haversine::distance(Point::from(from), Point::from(to)))
}

/// Initial great-circle bearing.
pub fn great_circle_bearing(from: Coordinate, to: Coordinate) -> Degrees {
    Degrees(Haversine::bearing(Point::from(from), Point::from(to))).normalized()
}

/// Constant-heading (loxodrome) bearing.
pub fn rhumb_bearing(from: Coordinate, to: Coordinate) -> Degrees {
    Degrees(Rhumb::bearing(Point::from(from), Point::from(to))).normalized()
}

/// Bearing used for every rotation on the map: 10 % rhumb, 90 % great circle.
///
/// The rhumb component is unwrapped next to the great-circle one before
/// blending so that bearings near ±180° do not average to 0.
pub fn map_angle(from: Coordinate, to: Coordinate) -> Degrees {
    let great = great_circle_bearing(from, to).value();
    let mut rhumb = rhumb_bearing(from, to).value();
    if rhumb - great > 180.0 {
        rhumb -= 360.0;
    } else if great - rhumb > 180.0 {
        rhumb += 360.0;
    }
    Degrees(RHUMB_WEIGHT * rhumb + (1.0 - RHUMB_WEIGHT) * great)
}

/// Web-mercator world pixel (y pointing down) at zoom 0.
pub fn project(coordinate: Coordinate) -> [f64; 2] {
    let x = (coordinate.lon + 180.0) / 360.0 * TILE_SIZE;
    let phi = coordinate.lat.to_radians();
    let y = (PI - (FRAC_PI_4 + phi / 2.0).tan().ln()) / (2.0 * PI) * TILE_SIZE;
    [x, y]
}

/// Screen-space angle of `from -> to` as the GPU arrow renderer computes it:
/// from projected pixel coordinates, y inverted back to "north is up".
pub fn projected_angle(from: Coordinate, to: Coordinate) -> Degrees {
    let [x1, y1] = project(from);
    let [mut x2, y2] = project(to);
    if x2 - x1 > TILE_SIZE / 2.0 {
        x2 -= TILE_SIZE;
    } else if x1 - x2 > TILE_SIZE / 2.0 {
        x2 += TILE_SIZE;
    }
    Degrees((x2 - x1).atan2(y1 - y2).to_degrees())
}

/// Ground meters covered by one screen pixel at `zoom` and `latitude`.
pub fn meters_per_pixel(zoom: f64, latitude: f64) -> f64 {
    2.0 * PI * EARTH_RADIUS * latitude.to_radians().cos() / (TILE_SIZE * 2f64.powf(zoom))
}
