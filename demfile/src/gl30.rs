//! SRTM GL30 (30 arc-second) global raster.
//!
//! A single flat file, `SRTMGL30_ALL.dem`, of big-endian `i16`
//! samples covering latitudes [-60, 90] and all longitudes. Row 0 is
//! the northern edge and column 0 the antimeridian.

use crate::{
    coord::LatLon,
    grid::BeGrid,
    sample::{Altitude, RawSample},
    DemError,
};
use log::debug;
use memmap2::Mmap;
use std::{
    fs::File,
    mem::size_of,
    path::{Path, PathBuf},
};

/// Name of the global raster inside a data root.
pub const GL30_FILE_NAME: &str = "SRTMGL30_ALL.dem";

/// Geometry of a coarse raster: sample intervals and the geographic
/// band its outermost samples sit on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarseLayout {
    /// Column intervals; each row holds `cols + 1` samples.
    pub cols: usize,
    /// Row intervals; the file holds `rows + 1` rows.
    pub rows: usize,
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl CoarseLayout {
    /// The SRTMGL30 global layout.
    pub const GL30: Self = Self {
        cols: 4800 * 9,
        rows: 6000 * 3,
        north: 90.0,
        south: -60.0,
        west: -180.0,
        east: 180.0,
    };

    pub const fn dimensions(&self) -> (usize, usize) {
        (self.rows + 1, self.cols + 1)
    }

    /// Expected file size in bytes.
    pub const fn file_size(&self) -> usize {
        (self.rows + 1) * (self.cols + 1) * size_of::<i16>()
    }

    /// Returns the fractional (row, column) of `pos`, or `None` when
    /// `pos` is outside the band.
    #[allow(clippy::cast_precision_loss)]
    fn position(&self, LatLon { lat, lon }: LatLon) -> Option<(f64, f64)> {
        if !(self.south..=self.north).contains(&lat) || !(self.west..=self.east).contains(&lon) {
            return None;
        }
        let row = (self.north - lat) / (self.north - self.south) * self.rows as f64;
        let col = (lon - self.west) / (self.east - self.west) * self.cols as f64;
        Some((row, col))
    }
}

pub struct CoarseRaster {
    path: PathBuf,
    layout: CoarseLayout,
    samples: Mmap,
}

impl CoarseRaster {
    /// Maps `SRTMGL30_ALL.dem` from the data root `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, DemError> {
        Self::open_with_layout(root.as_ref().join(GL30_FILE_NAME), CoarseLayout::GL30)
    }

    /// Maps a raster file with a custom layout.
    pub fn open_with_layout<P: AsRef<Path>>(
        path: P,
        layout: CoarseLayout,
    ) -> Result<Self, DemError> {
        let path = path.as_ref().to_owned();
        let file = File::open(&path)?;
        // SAFETY: the raster is opened read-only and is never modified
        // while the application runs.
        let samples = unsafe { Mmap::map(&file)? };
        if samples.len() != layout.file_size() || layout.rows < 1 || layout.cols < 1 {
            return Err(DemError::format(
                "gl30",
                format!(
                    "{} is {} bytes, expected {}",
                    path.display(),
                    samples.len(),
                    layout.file_size()
                ),
            ));
        }
        debug!("mapped {path:?}");
        Ok(Self {
            path,
            layout,
            samples,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &CoarseLayout {
        &self.layout
    }

    /// Returns the sample nearest to `pos`.
    pub fn raw_sample(&self, pos: LatLon) -> RawSample {
        match (self.grid(), self.layout.position(pos)) {
            (Some(grid), Some((row, col))) => grid.nearest(row, col),
            _ => RawSample::NONE,
        }
    }

    /// Returns the bilinearly interpolated altitude at `pos`.
    pub fn sampled_altitude(&self, pos: LatLon) -> Altitude {
        match (self.grid(), self.layout.position(pos)) {
            (Some(grid), Some((row, col))) => grid.bilinear(row, col),
            _ => Altitude::NONE,
        }
    }

    /// Like [`CoarseRaster::sampled_altitude`], but says why there is
    /// no value.
    pub fn altitude(&self, pos: LatLon) -> Result<f64, DemError> {
        let (row, col) = self.layout.position(pos).ok_or(DemError::OutOfCoverage {
            lat: pos.lat,
            lon: pos.lon,
        })?;
        let grid = self.grid().ok_or(DemError::NoData)?;
        grid.bilinear(row, col).get().ok_or(DemError::NoData)
    }
}

/// Private API
impl CoarseRaster {
    fn grid(&self) -> Option<BeGrid<'_>> {
        BeGrid::new(&self.samples, self.layout.dimensions()).ok()
    }
}
