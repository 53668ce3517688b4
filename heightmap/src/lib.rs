//! Ground elevation queries over heterogeneous elevation data.
//!
//! Every source implements [`HeightReader`]:
//!
//! - [`SrtmReader`]: SRTM GL1 tiles through a shared [`TileCache`],
//!   with the GL30 global raster as fallback.
//! - [`OmhmReader`]: one OMHM raster.
//! - [`StackReader`]: an ordered fallback chain of other readers.
//! - [`EmptyReader`]: no data anywhere.
//!
//! On top of point queries, readers provide altitude matrices and
//! terrain profiles along ellipsoidal geodesics.

mod cache;
pub mod config;
mod error;
pub mod geodesic;
mod omhm;
pub mod profile;
mod reader;
mod srtm;
mod stack;

pub use crate::{
    cache::TileCache,
    config::HeightmapConfig,
    error::HeightmapError,
    geodesic::{Ellipsoid, GeodesicModel},
    omhm::OmhmReader,
    profile::{PositionAndDistance, Profile, RelativePoint},
    reader::{EmptyReader, HeightReader, AUTOSTEP_M},
    srtm::{SrtmReader, FINE_PRECISION},
    stack::StackReader,
};
pub use demfile;
