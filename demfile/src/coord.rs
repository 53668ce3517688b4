//! Geographic coordinates and 1°×1° tile indexing.

use crate::DemError;
use geo::geometry::Coord;
use std::path::Path;

/// Suffix shared by every GL1 tile file.
pub const GL1_SUFFIX: &str = ".SRTMGL1.hgt.lz4";

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<Coord<f64>> for LatLon {
    fn from(Coord { x, y }: Coord<f64>) -> Self {
        Self { lat: y, lon: x }
    }
}

impl From<LatLon> for Coord<f64> {
    fn from(LatLon { lat, lon }: LatLon) -> Self {
        Coord { x: lon, y: lat }
    }
}

/// Identifies the GL1 tile whose southwest corner is at
/// (`lat`, `lon`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub lat: i32,
    pub lon: i32,
}

/// Position inside a tile, measured from its northwest sample.
///
/// `lat_frac` grows southward and `lon_frac` grows eastward, matching
/// the on-disk row order (row 0 is the northernmost row). Both lie in
/// `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileOffset {
    pub lat_frac: f64,
    pub lon_frac: f64,
}

impl TileKey {
    pub const fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Returns the tile containing `pos` and the offset of `pos`
    /// inside it, or `None` for non-finite input.
    pub fn locate(pos: LatLon) -> Option<(Self, TileOffset)> {
        if !pos.is_finite() {
            return None;
        }
        let lat_floor = pos.lat.floor();
        let lon_floor = pos.lon.floor();
        #[allow(clippy::cast_possible_truncation)]
        let key = Self {
            lat: lat_floor as i32,
            lon: lon_floor as i32,
        };
        let offset = TileOffset {
            lat_frac: 1.0 - (pos.lat - lat_floor),
            lon_frac: pos.lon - lon_floor,
        };
        Some((key, offset))
    }

    /// Returns the GL1 file name for this tile, e.g.
    /// `N44W072.SRTMGL1.hgt.lz4`.
    pub fn file_name(&self) -> String {
        let (n_s, lat) = {
            let lat = self.lat.unsigned_abs();
            let n_s = if self.lat.is_negative() { 'S' } else { 'N' };
            (n_s, lat)
        };
        let (e_w, lon) = {
            let lon = self.lon.unsigned_abs();
            let e_w = if self.lon.is_negative() { 'W' } else { 'E' };
            (e_w, lon)
        };
        format!("{n_s}{lat:02}{e_w}{lon:03}{GL1_SUFFIX}")
    }

    /// Parses a tile key from a GL1 file name or path.
    pub fn from_file_name<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let mk_err = || DemError::TileName(path.as_ref().to_owned());
        let name = path
            .as_ref()
            .file_name()
            .and_then(std::ffi::OsStr::to_str)
            .ok_or_else(mk_err)?;
        let stem = name.strip_suffix(GL1_SUFFIX).ok_or_else(mk_err)?;
        if stem.len() != 7 || !stem.is_ascii() {
            return Err(mk_err());
        }
        let lat_sign = match &stem[0..1] {
            "N" => 1,
            "S" => -1,
            _ => return Err(mk_err()),
        };
        let lat = lat_sign * stem[1..3].parse::<i32>().map_err(|_| mk_err())?;
        let lon_sign = match &stem[3..4] {
            "E" => 1,
            "W" => -1,
            _ => return Err(mk_err()),
        };
        let lon = lon_sign * stem[4..7].parse::<i32>().map_err(|_| mk_err())?;
        Ok(Self { lat, lon })
    }
}
