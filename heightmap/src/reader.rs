use crate::{
    geodesic::GeodesicModel,
    profile::{self, PositionAndDistance, RelativePoint},
};
use demfile::{Altitude, LatLon};
use std::sync::Arc;

/// Step used by the `*_autostep` profile methods, in meters.
pub const AUTOSTEP_M: f64 = 30.0;

/// A source of ground elevation.
///
/// `precision` is the caller's desired horizontal resolution in
/// arc-seconds; readers with several resolutions use it to pick one,
/// others ignore it. Queries never fail: a missing value is
/// [`Altitude::NONE`].
pub trait HeightReader: Send + Sync {
    fn read_altitude(&self, pos: LatLon, precision: f64) -> Altitude;

    /// Geodesic model used for profile walks.
    fn geodesic(&self) -> &GeodesicModel;

    /// Returns an independent copy of this reader.
    fn clone_reader(&self) -> Box<dyn HeightReader>;

    /// Samples every (lat, lon) pair, row-major over `lats`, putting
    /// `default` where there is no data.
    fn altitude_matrix(&self, lats: &[f64], lons: &[f64], precision: f64, default: f64) -> Vec<f64> {
        let mut matrix = Vec::with_capacity(lats.len() * lons.len());
        for &lat in lats {
            for &lon in lons {
                let altitude = self.read_altitude(LatLon::new(lat, lon), precision);
                matrix.push(altitude.unwrap_or(default));
            }
        }
        matrix
    }

    /// Samples the geodesic from `p1` to `p2` every `step` meters.
    ///
    /// The last sample is always `p2` at the full geodesic distance.
    fn profile(&self, p1: LatLon, p2: LatLon, step: f64, precision: f64) -> Vec<PositionAndDistance> {
        profile::walk(self, p1, p2, step, precision)
            .map(|(position, distance, altitude)| PositionAndDistance {
                position,
                altitude,
                distance,
            })
            .collect()
    }

    /// Like [`HeightReader::profile`], keeping only distance and
    /// altitude.
    fn relative_point_profile(
        &self,
        p1: LatLon,
        p2: LatLon,
        step: f64,
        precision: f64,
    ) -> Vec<RelativePoint> {
        profile::walk(self, p1, p2, step, precision)
            .map(|(_, distance, altitude)| RelativePoint { distance, altitude })
            .collect()
    }

    fn profile_autostep(&self, p1: LatLon, p2: LatLon, precision: f64) -> Vec<PositionAndDistance> {
        self.profile(p1, p2, AUTOSTEP_M, precision)
    }

    fn relative_point_profile_autostep(
        &self,
        p1: LatLon,
        p2: LatLon,
        precision: f64,
    ) -> Vec<RelativePoint> {
        self.relative_point_profile(p1, p2, AUTOSTEP_M, precision)
    }
}

impl Clone for Box<dyn HeightReader> {
    fn clone(&self) -> Self {
        self.clone_reader()
    }
}

/// A reader with no data at all.
#[derive(Debug, Clone, Default)]
pub struct EmptyReader {
    geodesic: Arc<GeodesicModel>,
}

impl EmptyReader {
    pub fn new(geodesic: Arc<GeodesicModel>) -> Self {
        Self { geodesic }
    }
}

impl HeightReader for EmptyReader {
    fn read_altitude(&self, _pos: LatLon, _precision: f64) -> Altitude {
        Altitude::NONE
    }

    fn geodesic(&self) -> &GeodesicModel {
        &self.geodesic
    }

    fn clone_reader(&self) -> Box<dyn HeightReader> {
        Box::new(self.clone())
    }
}
