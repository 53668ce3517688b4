//! Reader configuration.
//!
//! ```json
//! {
//!   "srtm_dir": "/data/srtm",
//!   "cache_size": 16,
//!   "omhm": ["/data/local/airfield.omhm"],
//!   "ellipsoid": { "semi_major_axis": 6378137.0, "flattening": 0.0033528106647474805 }
//! }
//! ```
//!
//! Every field is optional.

use crate::{
    cache::TileCache, geodesic::Ellipsoid, omhm::OmhmReader, srtm::SrtmReader,
    stack::StackReader, GeodesicModel, HeightmapError,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, path::PathBuf, sync::Arc};

pub const DEFAULT_CACHE_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapConfig {
    /// Directory with GL1 tiles and the GL30 raster.
    pub srtm_dir: Option<PathBuf>,

    /// Maximum number of decoded GL1 tiles kept in memory.
    pub cache_size: usize,

    /// OMHM rasters, highest priority first.
    pub omhm: Vec<PathBuf>,

    pub ellipsoid: Ellipsoid,
}

impl Default for HeightmapConfig {
    fn default() -> Self {
        Self {
            srtm_dir: None,
            cache_size: DEFAULT_CACHE_SIZE,
            omhm: Vec::new(),
            ellipsoid: Ellipsoid::WGS84,
        }
    }
}

impl HeightmapConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, HeightmapError> {
        let rdr = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(rdr)?)
    }

    /// Builds a stack of every OMHM raster followed by the SRTM reader.
    pub fn build_stack(&self) -> Result<StackReader, HeightmapError> {
        let geodesic = Arc::new(GeodesicModel::new(self.ellipsoid));
        let mut stack = StackReader::new(geodesic.clone());
        for path in &self.omhm {
            stack.push(Box::new(OmhmReader::open(path, geodesic.clone())?));
        }
        if let Some(srtm_dir) = &self.srtm_dir {
            if !srtm_dir.is_dir() {
                return Err(HeightmapError::Path(srtm_dir.clone()));
            }
            let cache = Arc::new(TileCache::new(srtm_dir, self.cache_size));
            stack.push(Box::new(SrtmReader::new(cache, geodesic)));
        }
        info!(
            "elevation stack: {} omhm, srtm: {:?}",
            self.omhm.len(),
            self.srtm_dir
        );
        Ok(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::{HeightmapConfig, DEFAULT_CACHE_SIZE};
    use crate::{geodesic::Ellipsoid, reader::HeightReader, HeightmapError};
    use demfile::{
        gl1::{write_tile, GL1_DIMENSION},
        LatLon, OmhmHeader, PixelType, TileKey,
    };
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config: HeightmapConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HeightmapConfig::default());
        assert_eq!(config.cache_size, DEFAULT_CACHE_SIZE);
        assert_eq!(config.ellipsoid, Ellipsoid::WGS84);
        assert_eq!(config.build_stack().unwrap().len(), 0);
    }

    #[test]
    fn test_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("heightmap.json");
        std::fs::write(
            &path,
            r#"{ "srtm_dir": "/data/srtm", "cache_size": 4,
                 "ellipsoid": { "semi_major_axis": 6371000.0, "flattening": 0.0 } }"#,
        )
        .unwrap();
        let config = HeightmapConfig::from_json_file(&path).unwrap();
        assert_eq!(config.cache_size, 4);
        assert_eq!(config.srtm_dir.as_deref(), Some(std::path::Path::new("/data/srtm")));
        assert!(config.omhm.is_empty());
        assert_eq!(config.ellipsoid.flattening, 0.0);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            HeightmapConfig::from_json_file(&path),
            Err(HeightmapError::Config(_))
        ));
    }

    #[test]
    fn test_missing_srtm_dir() {
        let dir = TempDir::new().unwrap();
        let config = HeightmapConfig {
            srtm_dir: Some(dir.path().join("nope")),
            ..HeightmapConfig::default()
        };
        assert!(matches!(config.build_stack(), Err(HeightmapError::Path(_))));
    }

    #[test]
    fn test_build_stack_order() {
        let dir = TempDir::new().unwrap();
        write_tile(
            dir.path(),
            TileKey::new(45, 7),
            &vec![300_i16; GL1_DIMENSION * GL1_DIMENSION],
        )
        .unwrap();

        // An OMHM raster over part of the same tile.
        let header = OmhmHeader {
            pixel_type: PixelType::Int16,
            width: 2,
            height: 2,
            transform: [7.0, 0.25, 0.0, 45.5, 0.0, -0.25],
            no_data: -32768.0,
            scale: 1.0,
            offset: 0.0,
            projection: "+proj=longlat +datum=WGS84 +no_defs".to_owned(),
        };
        let pixels: Vec<u8> = [5_i16; 4].iter().flat_map(|v| v.to_le_bytes()).collect();
        let omhm = dir.path().join("local.omhm");
        header
            .write(std::fs::File::create(&omhm).unwrap(), &pixels)
            .unwrap();

        let config = HeightmapConfig {
            srtm_dir: Some(dir.path().to_owned()),
            omhm: vec![omhm],
            ..HeightmapConfig::default()
        };
        let stack = config.build_stack().unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.read_altitude(LatLon::new(45.25, 7.25), 1.0).get(), Some(5.0));
        assert_eq!(stack.read_altitude(LatLon::new(45.75, 7.75), 1.0).get(), Some(300.0));
    }
}
