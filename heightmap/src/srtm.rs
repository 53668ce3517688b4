//! SRTM reader combining GL1 tiles with the GL30 raster.

use crate::{cache::TileCache, geodesic::GeodesicModel, reader::HeightReader};
use demfile::{Altitude, Gl1Tile, LatLon, TileKey};
use std::sync::{Arc, Mutex, PoisonError};

/// Precisions (arc-seconds) below this prefer GL1 tiles over GL30.
pub const FINE_PRECISION: f64 = 20.0;

pub struct SrtmReader {
    geodesic: Arc<GeodesicModel>,
    cache: Arc<TileCache>,

    /// Last tile this reader used, valid while the cache generation
    /// matches.
    last: Mutex<Option<LastTile>>,
}

struct LastTile {
    generation: u64,
    key: TileKey,
    tile: Arc<Gl1Tile>,
}

impl SrtmReader {
    pub fn new(cache: Arc<TileCache>, geodesic: Arc<GeodesicModel>) -> Self {
        Self {
            geodesic,
            cache,
            last: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Samples the GL1 tile containing `pos`.
    pub fn read_fine(&self, pos: LatLon) -> Altitude {
        let Some((key, offset)) = TileKey::locate(pos) else {
            return Altitude::NONE;
        };
        self.tile(key)
            .sampled_altitude(offset.lat_frac, offset.lon_frac)
    }

    /// Samples the GL30 raster.
    pub fn read_coarse(&self, pos: LatLon) -> Altitude {
        self.cache
            .coarse()
            .map_or(Altitude::NONE, |raster| raster.sampled_altitude(pos))
    }
}

/// Private API
impl SrtmReader {
    fn tile(&self, key: TileKey) -> Arc<Gl1Tile> {
        let generation = self.cache.generation();
        {
            let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(last) = last
                .as_ref()
                .filter(|last| last.key == key && last.generation == generation)
            {
                return last.tile.clone();
            }
        }

        let tile = self.cache.load(key);
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(LastTile {
            generation,
            key,
            tile: tile.clone(),
        });
        tile
    }
}

impl HeightReader for SrtmReader {
    fn read_altitude(&self, pos: LatLon, precision: f64) -> Altitude {
        if precision < FINE_PRECISION {
            self.read_fine(pos).or_else(|| self.read_coarse(pos))
        } else {
            self.read_coarse(pos).or_else(|| self.read_fine(pos))
        }
    }

    fn geodesic(&self) -> &GeodesicModel {
        &self.geodesic
    }

    fn clone_reader(&self) -> Box<dyn HeightReader> {
        Box::new(Self::new(self.cache.clone(), self.geodesic.clone()))
    }
}
