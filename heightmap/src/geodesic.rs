//! Ellipsoidal geodesics.
//!
//! Thin wrapper over [geographiclib-rs], the same solver backing the
//! `geo` crate's geodesic algorithms, but with a configurable
//! ellipsoid.
//!
//! [geographiclib-rs]: https://github.com/georust/geographiclib-rs

use demfile::LatLon;
use geographiclib_rs::{DirectGeodesic, Geodesic, InverseGeodesic};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Equatorial radius in meters.
    pub semi_major_axis: f64,
    pub flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Self = Self {
        semi_major_axis: 6_378_137.0,
        flattening: 1.0 / 298.257_223_563,
    };
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// Distance and bearings between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inverse {
    /// Meters along the geodesic.
    pub distance: f64,
    /// Forward azimuth at the first point, degrees clockwise from north.
    pub azimuth1: f64,
    /// Forward azimuth at the second point.
    pub azimuth2: f64,
}

pub struct GeodesicModel {
    ellipsoid: Ellipsoid,
    solver: Geodesic,
}

impl GeodesicModel {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        let solver = Geodesic::new(ellipsoid.semi_major_axis, ellipsoid.flattening);
        Self { ellipsoid, solver }
    }

    pub fn wgs84() -> Self {
        Self::new(Ellipsoid::WGS84)
    }

    pub fn ellipsoid(&self) -> Ellipsoid {
        self.ellipsoid
    }

    /// Solves the inverse problem from `p1` to `p2`.
    pub fn inverse(&self, p1: LatLon, p2: LatLon) -> Inverse {
        let (distance, azimuth1, azimuth2, _arc): (f64, f64, f64, f64) =
            self.solver.inverse(p1.lat, p1.lon, p2.lat, p2.lon);
        Inverse {
            distance,
            azimuth1,
            azimuth2,
        }
    }

    /// Returns the point `distance` meters from `start` along
    /// `azimuth`.
    pub fn direct(&self, start: LatLon, azimuth: f64, distance: f64) -> LatLon {
        let (lat, lon): (f64, f64) = self.solver.direct(start.lat, start.lon, azimuth, distance);
        LatLon::new(lat, lon)
    }
}

impl Default for GeodesicModel {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl fmt::Debug for GeodesicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeodesicModel")
            .field("ellipsoid", &self.ellipsoid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Ellipsoid, GeodesicModel};
    use approx::assert_relative_eq;
    use demfile::LatLon;

    #[test]
    fn test_equator_degree() {
        let geod = GeodesicModel::wgs84();
        let inv = geod.inverse(LatLon::new(0.0, 0.0), LatLon::new(0.0, 1.0));
        // One degree of longitude along the WGS84 equator.
        assert_relative_eq!(inv.distance, 111_319.490_793, epsilon = 1e-3);
        assert_relative_eq!(inv.azimuth1, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_direct_inverts_inverse() {
        let geod = GeodesicModel::wgs84();
        let start = LatLon::new(44.283_098, -71.308_307);
        let end = LatLon::new(44.256_281, -71.297_207);
        let inv = geod.inverse(start, end);
        let reached = geod.direct(start, inv.azimuth1, inv.distance);
        assert_relative_eq!(reached.lat, end.lat, epsilon = 1e-9);
        assert_relative_eq!(reached.lon, end.lon, epsilon = 1e-9);
    }

    #[test]
    fn test_sphere() {
        let radius = 6_371_000.0;
        let geod = GeodesicModel::new(Ellipsoid {
            semi_major_axis: radius,
            flattening: 0.0,
        });
        let inv = geod.inverse(LatLon::new(0.0, 0.0), LatLon::new(90.0, 0.0));
        assert_relative_eq!(inv.distance, radius * std::f64::consts::FRAC_PI_2, epsilon = 1e-6);
    }
}
