//! Elevation file formats.
//!
//! - [`Gl1Tile`]: 1 arc-second SRTM tiles, one LZ4 frame per 1°×1°
//!   tile, named after the tile's southwest corner.
//! - [`CoarseRaster`]: the 30 arc-second SRTMGL30 global raster.
//! - [`GenericRaster`]: OMHM single-band rasters in any PROJ.4
//!   coordinate system.
//!
//! # References
//!
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)
//! 1. [LZ4 Frame Format](https://github.com/lz4/lz4/blob/dev/doc/lz4_Frame_format.md)
//! 1. [GDAL geotransform](https://gdal.org/tutorials/geotransforms_tut.html)

mod coord;
mod error;
pub mod gl1;
pub mod gl30;
mod grid;
pub mod omhm;
mod sample;

pub use crate::{
    coord::{LatLon, TileKey, TileOffset, GL1_SUFFIX},
    error::DemError,
    gl1::Gl1Tile,
    gl30::{CoarseLayout, CoarseRaster, GL30_FILE_NAME},
    omhm::{GenericRaster, OmhmHeader, PixelType},
    sample::{Altitude, RawSample, VOID_SAMPLE},
};
