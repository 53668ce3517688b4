//! SRTM GL1 (1 arc-second) LZ4-compressed tiles.
//!
//! A tile file is named after its southwest corner, e.g.
//! `N44W072.SRTMGL1.hgt.lz4`, and holds a single LZ4 frame stream that
//! decompresses to 3601×3601 big-endian `i16` samples, row-major, with
//! row 0 at the tile's northern edge.

use crate::{
    coord::{TileKey, GL1_SUFFIX},
    grid::BeGrid,
    sample::{Altitude, RawSample, VOID_SAMPLE},
    DemError,
};
use log::debug;
use lz4_flex::frame::{FrameDecoder, FrameEncoder};
use memmap2::Mmap;
use std::{
    fs::File,
    io::{BufWriter, ErrorKind, Read, Write},
    mem::size_of,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

/// Number of samples per row and per column.
pub const GL1_DIMENSION: usize = 3601;

/// Decompressed size of one tile in bytes.
pub const GL1_SIZE: usize = GL1_DIMENSION * GL1_DIMENSION * size_of::<i16>();

/// Sample intervals per tile edge (one per arc-second).
#[allow(clippy::cast_precision_loss)]
const GL1_INTERVALS: f64 = (GL1_DIMENSION - 1) as f64;

pub struct Gl1Tile {
    /// Tile this data was loaded for, `None` for the invalid tile.
    key: Option<TileKey>,

    /// Lowest and highest non-void samples, computed on first use.
    extremes: OnceLock<Option<(i16, i16)>>,

    /// Decompressed sample bytes, `None` for the invalid tile.
    samples: Option<Box<[u8]>>,
}

impl Gl1Tile {
    /// Decodes the tile for `key` from `dir`.
    pub fn load<P: AsRef<Path>>(dir: P, key: TileKey) -> Result<Self, DemError> {
        let path = dir.as_ref().join(key.file_name());
        let samples = decompress_file(&path)?;
        Ok(Self {
            key: Some(key),
            extremes: OnceLock::new(),
            samples: Some(samples),
        })
    }

    /// Returns the shared tile which answers every query with "no
    /// data".
    ///
    /// Used in place of tiles that failed to load so the failure can be
    /// cached like a success.
    pub fn invalid() -> Arc<Self> {
        static INVALID: OnceLock<Arc<Gl1Tile>> = OnceLock::new();
        INVALID
            .get_or_init(|| {
                Arc::new(Self {
                    key: None,
                    extremes: OnceLock::new(),
                    samples: None,
                })
            })
            .clone()
    }

    pub fn is_valid(&self) -> bool {
        self.samples.is_some()
    }

    pub fn key(&self) -> Option<TileKey> {
        self.key
    }

    /// Returns the sample nearest to the tile offset.
    ///
    /// Fractions are measured from the northwest sample, southward and
    /// eastward, and must lie in `[0, 1]`.
    pub fn raw_sample(&self, lat_frac: f64, lon_frac: f64) -> RawSample {
        match self.grid(lat_frac, lon_frac) {
            Some(grid) => grid.nearest(lat_frac * GL1_INTERVALS, lon_frac * GL1_INTERVALS),
            None => RawSample::NONE,
        }
    }

    /// Returns the bilinearly interpolated altitude at the tile offset.
    pub fn sampled_altitude(&self, lat_frac: f64, lon_frac: f64) -> Altitude {
        match self.grid(lat_frac, lon_frac) {
            Some(grid) => grid.bilinear(lat_frac * GL1_INTERVALS, lon_frac * GL1_INTERVALS),
            None => Altitude::NONE,
        }
    }

    /// Returns the lowest non-void sample in this tile.
    pub fn min_elevation(&self) -> Option<i16> {
        self.extremes().map(|(min, _)| min)
    }

    /// Returns the highest non-void sample in this tile.
    pub fn max_elevation(&self) -> Option<i16> {
        self.extremes().map(|(_, max)| max)
    }
}

/// Private API
impl Gl1Tile {
    fn grid(&self, lat_frac: f64, lon_frac: f64) -> Option<BeGrid<'_>> {
        let samples = self.samples.as_deref()?;
        if !(0.0..=1.0).contains(&lat_frac) || !(0.0..=1.0).contains(&lon_frac) {
            return None;
        }
        BeGrid::new(samples, (GL1_DIMENSION, GL1_DIMENSION)).ok()
    }

    fn extremes(&self) -> Option<(i16, i16)> {
        *self.extremes.get_or_init(|| {
            let samples = self.samples.as_deref()?;
            let grid = BeGrid::new(samples, (GL1_DIMENSION, GL1_DIMENSION)).ok()?;
            grid.iter()
                .filter(|&sample| sample != VOID_SAMPLE)
                .fold(None, |acc, sample| match acc {
                    None => Some((sample, sample)),
                    Some((min, max)) => Some((min.min(sample), max.max(sample))),
                })
        })
    }
}

/// Writes `samples` (3601×3601, row 0 north) as the GL1 tile for
/// `key` in `dir`, returning the file path.
pub fn write_tile<P: AsRef<Path>>(
    dir: P,
    key: TileKey,
    samples: &[i16],
) -> Result<PathBuf, DemError> {
    if samples.len() != GL1_DIMENSION * GL1_DIMENSION {
        return Err(DemError::format(
            "gl1",
            format!("{} samples, expected {}", samples.len(), GL1_DIMENSION * GL1_DIMENSION),
        ));
    }
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
    let path = dir.as_ref().join(key.file_name());
    write_frame(&path, &bytes)?;
    Ok(path)
}

/// Compresses a raw 1 arc-second `.hgt` file (e.g. `N44W072.hgt`) into
/// a GL1 tile in `dst_dir`, returning the new file's path.
pub fn pack_hgt<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst_dir: Q) -> Result<PathBuf, DemError> {
    let src = src.as_ref();
    let stem = src
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(|| DemError::TileName(src.to_owned()))?;
    let key = TileKey::from_file_name(format!("{stem}{GL1_SUFFIX}"))
        .map_err(|_| DemError::TileName(src.to_owned()))?;
    let bytes = std::fs::read(src)?;
    if bytes.len() != GL1_SIZE {
        return Err(DemError::format(
            "hgt",
            format!("{} is {} bytes, expected {GL1_SIZE}", src.display(), bytes.len()),
        ));
    }
    let path = dst_dir.as_ref().join(key.file_name());
    write_frame(&path, &bytes)?;
    debug!("packed {src:?} into {path:?}");
    Ok(path)
}

pub(crate) fn write_frame(path: &Path, bytes: &[u8]) -> Result<(), DemError> {
    let mut encoder = FrameEncoder::new(BufWriter::new(File::create(path)?));
    encoder.write_all(bytes)?;
    let mut writer = encoder
        .finish()
        .map_err(|e| std::io::Error::new(ErrorKind::Other, e))?;
    writer.flush()?;
    Ok(())
}

fn decompress_file(path: &Path) -> Result<Box<[u8]>, DemError> {
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and dropped before returning;
    // tile files are not modified while the application runs.
    let compressed = unsafe { Mmap::map(&file)? };

    let mut decoder = FrameDecoder::new(&compressed[..]);
    let mut samples = vec![0_u8; GL1_SIZE].into_boxed_slice();
    let mut filled = 0;
    while filled < GL1_SIZE {
        match decoder.read(&mut samples[filled..]) {
            Ok(0) => {
                return Err(DemError::decode(
                    path,
                    format!("stream ended after {filled} of {GL1_SIZE} bytes"),
                ))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(DemError::decode(path, e)),
        }
    }

    let mut overrun = [0_u8; 1];
    match decoder.read(&mut overrun) {
        Ok(0) => Ok(samples),
        Ok(_) => Err(DemError::decode(
            path,
            format!("stream decodes past {GL1_SIZE} bytes"),
        )),
        Err(e) => Err(DemError::decode(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::{pack_hgt, write_frame, write_tile, Gl1Tile, GL1_DIMENSION, GL1_SIZE};
    use crate::{coord::TileKey, sample::VOID_SAMPLE, DemError};
    use approx::assert_relative_eq;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    const KEY: TileKey = TileKey::new(44, -72);

    /// Elevation rises by one meter per row southward and two per
    /// column eastward, offset so no sample is void.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn gradient(row: usize, col: usize) -> i16 {
        (row + 2 * col) as i16 - 5000
    }

    fn samples_with(f: impl Fn(usize, usize) -> i16) -> Vec<i16> {
        let mut samples = Vec::with_capacity(GL1_DIMENSION * GL1_DIMENSION);
        for row in 0..GL1_DIMENSION {
            for col in 0..GL1_DIMENSION {
                samples.push(f(row, col));
            }
        }
        samples
    }

    fn gradient_tile(dir: &TempDir) -> Gl1Tile {
        write_tile(dir.path(), KEY, &samples_with(gradient)).unwrap();
        Gl1Tile::load(dir.path(), KEY).unwrap()
    }

    #[test]
    fn test_corner_sample_is_exact() {
        let dir = TempDir::new().unwrap();
        let tile = gradient_tile(&dir);
        let corner = gradient(0, 0);
        assert_eq!(tile.raw_sample(0.0, 0.0).get(), Some(corner));
        assert_eq!(
            tile.sampled_altitude(0.0, 0.0).get().map(f64::to_bits),
            Some(f64::from(corner).to_bits())
        );
        assert_eq!(tile.raw_sample(1.0, 1.0).get(), Some(gradient(3600, 3600)));
        assert_eq!(
            tile.sampled_altitude(1.0, 1.0).get(),
            Some(f64::from(gradient(3600, 3600)))
        );
    }

    #[test]
    fn test_bilinear_between_samples() {
        let dir = TempDir::new().unwrap();
        let tile = gradient_tile(&dir);
        // Half way between rows 10 and 11, a quarter into column 20.
        let lat_frac = 10.5 / 3600.0;
        let lon_frac = 20.25 / 3600.0;
        let expected = 10.5 + 2.0 * 20.25 - 5000.0;
        assert_relative_eq!(
            tile.sampled_altitude(lat_frac, lon_frac).get().unwrap(),
            expected,
            epsilon = 1e-6
        );
        assert_eq!(tile.raw_sample(lat_frac, lon_frac).get(), Some(gradient(10, 20)));
    }

    #[test]
    fn test_sampled_altitude_is_continuous() {
        let dir = TempDir::new().unwrap();
        let tile = gradient_tile(&dir);
        let frac = 0.123_456;
        let at = tile.sampled_altitude(frac, frac).get().unwrap();
        for eps in [1e-3, 1e-5, 1e-7, 1e-9] {
            let near = tile.sampled_altitude(frac, frac + eps).get().unwrap();
            assert!((near - at).abs() <= 2.0 * 3600.0 * eps + 1e-9);
        }
    }

    #[test]
    fn test_void_samples() {
        let dir = TempDir::new().unwrap();
        let samples = samples_with(|row, col| {
            if row == 0 && col == 1 {
                VOID_SAMPLE
            } else {
                100
            }
        });
        write_tile(dir.path(), KEY, &samples).unwrap();
        let tile = Gl1Tile::load(dir.path(), KEY).unwrap();
        assert!(tile.raw_sample(0.0, 1.5 / 3600.0).is_none());
        assert!(tile.sampled_altitude(0.5 / 3600.0, 0.5 / 3600.0).is_none());
        assert_eq!(tile.sampled_altitude(0.5, 0.5).get(), Some(100.0));
        assert_eq!(tile.min_elevation(), Some(100));
        assert_eq!(tile.max_elevation(), Some(100));
    }

    #[test]
    fn test_out_of_range_fractions() {
        let dir = TempDir::new().unwrap();
        let tile = gradient_tile(&dir);
        assert!(tile.raw_sample(-0.1, 0.5).is_none());
        assert!(tile.sampled_altitude(0.5, 1.1).is_none());
        assert!(tile.sampled_altitude(f64::NAN, 0.5).is_none());
    }

    #[test]
    fn test_extremes() {
        let dir = TempDir::new().unwrap();
        let tile = gradient_tile(&dir);
        assert_eq!(tile.min_elevation(), Some(gradient(0, 0)));
        assert_eq!(tile.max_elevation(), Some(gradient(3600, 3600)));
        assert_eq!(tile.key(), Some(KEY));
    }

    #[test]
    fn test_invalid_tile() {
        let invalid = Gl1Tile::invalid();
        assert!(!invalid.is_valid());
        assert!(invalid.raw_sample(0.0, 0.0).is_none());
        assert!(invalid.sampled_altitude(0.5, 0.5).is_none());
        assert_eq!(invalid.min_elevation(), None);
        assert!(std::sync::Arc::ptr_eq(&invalid, &Gl1Tile::invalid()));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        match Gl1Tile::load(dir.path(), KEY) {
            Err(DemError::Io(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
            _ => panic!("expected NotFound"),
        }
    }

    #[test]
    fn test_short_stream() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(KEY.file_name());
        write_frame(&path, &vec![0_u8; GL1_SIZE / 2]).unwrap();
        assert!(matches!(
            Gl1Tile::load(dir.path(), KEY),
            Err(DemError::Decode { .. })
        ));
    }

    #[test]
    fn test_overlong_stream() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(KEY.file_name());
        write_frame(&path, &vec![0_u8; GL1_SIZE + 2]).unwrap();
        assert!(matches!(
            Gl1Tile::load(dir.path(), KEY),
            Err(DemError::Decode { .. })
        ));
    }

    #[test]
    fn test_truncated_file() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(dir.path(), KEY, &samples_with(gradient)).unwrap();
        let len = std::fs::metadata(&path).unwrap().len();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len / 2).unwrap();
        assert!(matches!(
            Gl1Tile::load(dir.path(), KEY),
            Err(DemError::Decode { .. })
        ));
    }

    #[test]
    fn test_garbage_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(KEY.file_name()), b"definitely not lz4").unwrap();
        assert!(matches!(
            Gl1Tile::load(dir.path(), KEY),
            Err(DemError::Decode { .. })
        ));
    }

    #[test]
    fn test_pack_hgt() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        let samples = samples_with(gradient);
        let raw: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
        let src = src_dir.path().join("N44W072.hgt");
        std::fs::write(&src, raw).unwrap();

        let packed = pack_hgt(&src, dst_dir.path()).unwrap();
        assert_eq!(TileKey::from_file_name(&packed).unwrap(), KEY);
        let tile = Gl1Tile::load(dst_dir.path(), KEY).unwrap();
        assert_eq!(tile.raw_sample(0.5, 0.5).get(), Some(gradient(1800, 1800)));
    }

    #[test]
    fn test_pack_hgt_rejects_bad_input() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        let short = src_dir.path().join("N44W072.hgt");
        std::fs::write(&short, [0_u8; 16]).unwrap();
        assert!(matches!(
            pack_hgt(&short, dst_dir.path()),
            Err(DemError::Format { .. })
        ));
        let badly_named = src_dir.path().join("mt_washington.hgt");
        std::fs::write(&badly_named, [0_u8; 16]).unwrap();
        assert!(matches!(
            pack_hgt(&badly_named, dst_dir.path()),
            Err(DemError::TileName(_))
        ));
    }
}
