use crate::{geodesic::GeodesicModel, reader::HeightReader, HeightmapError};
use demfile::{Altitude, GenericRaster, LatLon};
use log::debug;
use std::{path::Path, sync::Arc};

/// Reader over a single OMHM raster. Ignores the precision hint.
#[derive(Clone)]
pub struct OmhmReader {
    geodesic: Arc<GeodesicModel>,
    raster: Arc<GenericRaster>,
}

impl OmhmReader {
    pub fn open<P: AsRef<Path>>(path: P, geodesic: Arc<GeodesicModel>) -> Result<Self, HeightmapError> {
        let raster = GenericRaster::open(&path)?;
        debug!("omhm reader for {:?}", path.as_ref());
        Ok(Self::from_raster(Arc::new(raster), geodesic))
    }

    pub fn from_raster(raster: Arc<GenericRaster>, geodesic: Arc<GeodesicModel>) -> Self {
        Self { geodesic, raster }
    }

    pub fn raster(&self) -> &GenericRaster {
        &self.raster
    }
}

impl HeightReader for OmhmReader {
    fn read_altitude(&self, pos: LatLon, _precision: f64) -> Altitude {
        self.raster.sampled_altitude(pos)
    }

    fn geodesic(&self) -> &GeodesicModel {
        &self.geodesic
    }

    fn clone_reader(&self) -> Box<dyn HeightReader> {
        Box::new(self.clone())
    }
}
