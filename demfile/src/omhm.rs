//! OMHM generic raster container.
//!
//! All values are little-endian:
//!
//! | field        | type         |
//! |--------------|--------------|
//! | magic        | `u32`        |
//! | version      | `u32`        |
//! | reserved     | `u32`        |
//! | pixel type   | `u32`        |
//! | width        | `u32`        |
//! | height       | `u32`        |
//! | geotransform | `6 × f64`    |
//! | no-data      | `f64`        |
//! | scale        | `f64`        |
//! | offset       | `f64`        |
//! | desc len     | `u64`        |
//! | desc         | PROJ.4 text  |
//! | crc32        | `u32`        |
//! | pixels       | width×height |
//!
//! The CRC covers every header byte before it. The geotransform maps
//! pixel (col, row) to projected coordinates:
//! `x = t0 + col·t1 + row·t2`, `y = t3 + col·t4 + row·t5`.

use crate::{coord::LatLon, sample::Altitude, DemError};
use byteorder::{ByteOrder, LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use log::debug;
use memmap2::Mmap;
use num_traits::AsPrimitive;
use proj4rs::{proj::Proj, transform::transform};
use std::{
    fs::File,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

pub const OMHM_MAGIC: u32 = u32::from_le_bytes(*b"OMHM");
pub const OMHM_VERSION: u32 = 1;

/// Bytes before the projection description.
const FIXED_HEADER_LEN: usize = 6 * 4 + 10 * 8;

const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Scalar type of an OMHM pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl PixelType {
    pub fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => Self::Int8,
            1 => Self::UInt8,
            2 => Self::Int16,
            3 => Self::UInt16,
            4 => Self::Int32,
            5 => Self::UInt32,
            6 => Self::Int64,
            7 => Self::UInt64,
            8 => Self::Float32,
            9 => Self::Float64,
            _ => return None,
        })
    }

    pub fn tag(self) -> u32 {
        match self {
            Self::Int8 => 0,
            Self::UInt8 => 1,
            Self::Int16 => 2,
            Self::UInt16 => 3,
            Self::Int32 => 4,
            Self::UInt32 => 5,
            Self::Int64 => 6,
            Self::UInt64 => 7,
            Self::Float32 => 8,
            Self::Float64 => 9,
        }
    }

    /// Size of one pixel in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Decodes the pixel at the start of `bytes` as `f64`, or `None`
    /// if `bytes` is shorter than one pixel.
    pub fn decode(self, bytes: &[u8]) -> Option<f64> {
        let bytes = bytes.get(..self.size())?;
        Some(match self {
            Self::Int8 => widen(bytes[0] as i8),
            Self::UInt8 => widen(bytes[0]),
            Self::Int16 => widen(LE::read_i16(bytes)),
            Self::UInt16 => widen(LE::read_u16(bytes)),
            Self::Int32 => widen(LE::read_i32(bytes)),
            Self::UInt32 => widen(LE::read_u32(bytes)),
            Self::Int64 => widen(LE::read_i64(bytes)),
            Self::UInt64 => widen(LE::read_u64(bytes)),
            Self::Float32 => widen(LE::read_f32(bytes)),
            Self::Float64 => LE::read_f64(bytes),
        })
    }
}

fn widen<T: AsPrimitive<f64>>(value: T) -> f64 {
    value.as_()
}

/// Everything in an OMHM file except the pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct OmhmHeader {
    pub pixel_type: PixelType,
    pub width: u32,
    pub height: u32,
    pub transform: [f64; 6],
    pub no_data: f64,
    pub scale: f64,
    pub offset: f64,
    /// PROJ.4 definition of the raster's coordinate system.
    pub projection: String,
}

impl OmhmHeader {
    /// Size of the pixel section described by this header.
    pub fn data_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.pixel_type.size())
    }

    /// Writes the serialized header followed by its CRC.
    pub fn write_header<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let mut out = CrcWriter {
            inner: writer,
            hasher: crc32fast::Hasher::new(),
        };
        self.write_fields(&mut out)?;
        let CrcWriter { mut inner, hasher } = out;
        inner.write_u32::<LE>(hasher.finalize())
    }

    /// Writes a complete OMHM file: header, CRC and `pixels`.
    pub fn write<W: Write>(&self, mut writer: W, pixels: &[u8]) -> Result<(), DemError> {
        if self.data_len() != Some(pixels.len()) {
            return Err(DemError::format(
                "omhm",
                format!(
                    "{} pixel bytes for a {}x{} {:?} raster",
                    pixels.len(),
                    self.width,
                    self.height,
                    self.pixel_type
                ),
            ));
        }
        self.write_header(&mut writer)?;
        writer.write_all(pixels)?;
        writer.flush()?;
        Ok(())
    }

    fn write_fields<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_u32::<LE>(OMHM_MAGIC)?;
        out.write_u32::<LE>(OMHM_VERSION)?;
        out.write_u32::<LE>(0)?;
        out.write_u32::<LE>(self.pixel_type.tag())?;
        out.write_u32::<LE>(self.width)?;
        out.write_u32::<LE>(self.height)?;
        for coefficient in self.transform {
            out.write_f64::<LE>(coefficient)?;
        }
        out.write_f64::<LE>(self.no_data)?;
        out.write_f64::<LE>(self.scale)?;
        out.write_f64::<LE>(self.offset)?;
        out.write_u64::<LE>(self.projection.len() as u64)?;
        out.write_all(self.projection.as_bytes())
    }
}

/// Forwards writes while hashing everything written.
struct CrcWriter<W> {
    inner: W,
    hasher: crc32fast::Hasher,
}

impl<W: Write> Write for CrcWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

enum Store {
    InMem(Box<[u8]>),
    MemMap(Mmap),
}

impl Store {
    fn bytes(&self) -> &[u8] {
        match self {
            Self::InMem(bytes) => &bytes[..],
            Self::MemMap(mmap) => &mmap[..],
        }
    }
}

pub struct GenericRaster {
    path: Option<PathBuf>,
    header: OmhmHeader,
    /// `t2·t4 - t1·t5`, the geotransform's (negated) determinant.
    det: f64,
    /// The raster's coordinate system is geographic (degrees).
    geographic: bool,
    wgs84: Proj,
    native: Proj,
    /// Offset of the first pixel in `store`.
    data_start: usize,
    store: Store,
}

impl GenericRaster {
    /// Maps and validates the OMHM file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let file = File::open(&path)?;
        // SAFETY: the raster is opened read-only and is never modified
        // while the application runs.
        let mmap = unsafe { Mmap::map(&file)? };
        let mut raster = Self::parse(Store::MemMap(mmap))?;
        debug!(
            "opened {:?}: {}x{} {:?}, transform {:?}",
            path.as_ref(),
            raster.header.width,
            raster.header.height,
            raster.header.pixel_type,
            raster.header.transform
        );
        raster.path = Some(path.as_ref().to_owned());
        Ok(raster)
    }

    /// Validates an OMHM file already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DemError> {
        Self::parse(Store::InMem(bytes.into_boxed_slice()))
    }

    pub fn header(&self) -> &OmhmHeader {
        &self.header
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the altitude at `pos`, or "no data".
    pub fn sampled_altitude(&self, pos: LatLon) -> Altitude {
        self.altitude(pos).ok().into()
    }

    /// Like [`GenericRaster::sampled_altitude`], but says why there is
    /// no value.
    pub fn altitude(&self, pos: LatLon) -> Result<f64, DemError> {
        let out_of_coverage = || DemError::OutOfCoverage {
            lat: pos.lat,
            lon: pos.lon,
        };
        let (x, y) = self.project(pos).ok_or_else(out_of_coverage)?;
        let (col, row) = self.pixel(x, y).ok_or_else(out_of_coverage)?;

        let pixel_type = self.header.pixel_type;
        let start = self.data_start + (row * self.header.width as usize + col) * pixel_type.size();
        let bytes = &self.store.bytes()[start..start + pixel_type.size()];
        let raw = pixel_type
            .decode(bytes)
            .ok_or_else(|| DemError::format("omhm", "pixel outside data section"))?;
        if raw == self.header.no_data || raw.is_nan() {
            return Err(DemError::NoData);
        }
        Ok(raw.mul_add(self.header.scale, self.header.offset))
    }
}

/// Private API
impl GenericRaster {
    fn parse(store: Store) -> Result<Self, DemError> {
        let err = |reason: &str| DemError::format("omhm", reason);
        let bytes = store.bytes();
        if bytes.len() < FIXED_HEADER_LEN {
            return Err(err("file too small"));
        }

        let mut rdr = Cursor::new(bytes);
        if rdr.read_u32::<LE>()? != OMHM_MAGIC {
            return Err(err("invalid magic header"));
        }
        let version = rdr.read_u32::<LE>()?;
        let _reserved = rdr.read_u32::<LE>()?;
        let pixel_tag = rdr.read_u32::<LE>()?;
        let width = rdr.read_u32::<LE>()?;
        let height = rdr.read_u32::<LE>()?;
        let mut transform = [0.0; 6];
        for coefficient in &mut transform {
            *coefficient = rdr.read_f64::<LE>()?;
        }
        let no_data = rdr.read_f64::<LE>()?;
        let scale = rdr.read_f64::<LE>()?;
        let offset = rdr.read_f64::<LE>()?;
        let desc_len = rdr.read_u64::<LE>()?;

        let desc_start = FIXED_HEADER_LEN;
        let crc_start = usize::try_from(desc_len)
            .ok()
            .and_then(|len| desc_start.checked_add(len))
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| err("invalid description size"))?;
        let data_start = crc_start + 4;
        if bytes.len() < data_start {
            return Err(err("file too small"));
        }
        let crc = LE::read_u32(&bytes[crc_start..data_start]);
        if crc32fast::hash(&bytes[..crc_start]) != crc {
            return Err(err("invalid header crc"));
        }

        if version != OMHM_VERSION {
            return Err(err("invalid version tag"));
        }
        let pixel_type = PixelType::from_tag(pixel_tag).ok_or_else(|| err("invalid data type tag"))?;
        let projection = std::str::from_utf8(&bytes[desc_start..crc_start])
            .map_err(|_| err("projection description is not utf-8"))?
            .to_owned();

        let header = OmhmHeader {
            pixel_type,
            width,
            height,
            transform,
            no_data,
            scale,
            offset,
            projection,
        };
        if header.data_len() != Some(bytes.len() - data_start) {
            return Err(err("invalid file size data section"));
        }

        let [_, t1, t2, _, t4, t5] = transform;
        let det = t2 * t4 - t1 * t5;
        if !det.is_normal() {
            return Err(err("singular geotransform"));
        }

        let native = Proj::from_proj_string(&header.projection)
            .map_err(|e| DemError::format("omhm", format!("projection {:?}: {e:?}", header.projection)))?;
        let wgs84 = Proj::from_proj_string(WGS84)
            .map_err(|e| DemError::format("omhm", format!("projection {WGS84:?}: {e:?}")))?;
        let geographic = ["+proj=longlat", "+proj=latlong"]
            .iter()
            .any(|p| header.projection.contains(p));

        Ok(Self {
            path: None,
            header,
            det,
            geographic,
            wgs84,
            native,
            data_start,
            store,
        })
    }

    /// WGS84 `pos` in the raster's coordinate system.
    fn project(&self, pos: LatLon) -> Option<(f64, f64)> {
        if !pos.is_finite() {
            return None;
        }
        let mut point = (pos.lon.to_radians(), pos.lat.to_radians(), 0.0);
        transform(&self.wgs84, &self.native, &mut point).ok()?;
        let (x, y) = if self.geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    /// Inverts the geotransform, returning the (col, row) containing
    /// projected (`x`, `y`).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn pixel(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let [t0, t1, t2, t3, t4, t5] = self.header.transform;
        let t3_y = t3 - y;
        let x_t0 = x - t0;
        let col = -(t2 * t3_y + t5 * x_t0) / self.det;
        let row = (t1 * t3_y + t4 * x_t0) / self.det;
        let inside = (0.0..f64::from(self.header.width)).contains(&col)
            && (0.0..f64::from(self.header.height)).contains(&row);
        inside.then(|| (col as usize, row as usize))
    }
}
