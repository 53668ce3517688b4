use anyhow::{anyhow, Error as AnyError};
use clap::{Parser, Subcommand};
use geo::geometry::Coord;
use std::{path::PathBuf, str::FromStr};

/// Query ground elevation from SRTM and OMHM data.
#[derive(Parser, Debug)]
pub struct Cli {
    /// JSON reader configuration; flags below override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory containing GL1 tiles and SRTMGL30_ALL.dem.
    #[arg(short, long)]
    pub srtm_dir: Option<PathBuf>,

    /// OMHM raster, highest priority first. May be repeated.
    #[arg(long)]
    pub omhm: Vec<PathBuf>,

    /// Maximum number of decoded tiles held in memory.
    #[arg(long)]
    pub cache_size: Option<usize>,

    /// Desired resolution in arc-seconds. Below 20 prefers GL1 tiles.
    #[arg(short, long, default_value_t = 1.0)]
    pub precision: f64,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Clone, Copy, Debug)]
pub struct LatLon(pub Coord<f64>);

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_str, lon_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon pair"))?;
        let lat = f64::from_str(lat_str.trim())?;
        let lon = f64::from_str(lon_str.trim())?;
        Ok(Self(Coord { y: lat, x: lon }))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the elevation at a point.
    Point {
        /// "lat,lon"
        #[arg(allow_hyphen_values = true)]
        at: LatLon,
    },

    /// Sample elevation along the geodesic between two points.
    Profile {
        /// Start "lat,lon"
        #[arg(long)]
        start: LatLon,

        /// Destination "lat,lon"
        #[arg(long)]
        dest: LatLon,

        /// Distance between samples in meters.
        #[arg(long)]
        step: Option<f64>,

        /// Height above ground at the start in meters.
        #[arg(long)]
        start_alt: Option<f64>,

        /// Height above ground at the destination in meters.
        #[arg(long)]
        dest_alt: Option<f64>,

        #[command(subcommand)]
        out: ProfileOutput,
    },

    /// Sample a regular grid and print it as JSON.
    Matrix {
        /// Northwest corner "lat,lon"
        #[arg(long)]
        nw: LatLon,

        /// Southeast corner "lat,lon"
        #[arg(long)]
        se: LatLon,

        /// Samples per axis.
        #[arg(long, default_value_t = 16)]
        size: usize,

        /// Value written where there is no data.
        #[arg(long, default_value_t = 0.0)]
        default: f64,
    },

    /// Print statistics of a GL1 tile file.
    Tile {
        /// Path to a `*.SRTMGL1.hgt.lz4` file.
        path: PathBuf,
    },

    /// Compress a raw 1 arc-second `.hgt` file into a GL1 tile.
    Pack {
        /// Source `.hgt` file, e.g. N44W072.hgt.
        src: PathBuf,

        /// Output directory.
        dst_dir: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileOutput {
    /// Print profile values to screen.
    Display,

    /// Print profile values as JSON.
    Json,

    /// Draw the profile in the terminal.
    Plot,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, LatLon, ProfileOutput};
    use clap::Parser;
    use std::str::FromStr;

    #[test]
    fn test_parse_lat_lon() {
        let LatLon(pos) = LatLon::from_str("44.2705,-71.30325").unwrap();
        assert_eq!(pos.y, 44.2705);
        assert_eq!(pos.x, -71.30325);
        assert!(LatLon::from_str("44.2705").is_err());
        assert!(LatLon::from_str("north,west").is_err());
    }

    #[test]
    fn test_parse_cli() {
        let cli = Cli::try_parse_from([
            "hmtool",
            "--srtm-dir=/data/srtm",
            "--omhm=a.omhm",
            "--omhm=b.omhm",
            "profile",
            "--start=44.28,-71.30",
            "--dest=44.25,-71.29",
            "--step=90",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.omhm.len(), 2);
        assert_eq!(cli.precision, 1.0);
        match cli.cmd {
            Command::Profile {
                step,
                out: ProfileOutput::Json,
                ..
            } => assert_eq!(step, Some(90.0)),
            cmd => panic!("unexpected {cmd:?}"),
        }
    }
}
