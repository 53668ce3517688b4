mod options;

use anyhow::Error as AnyError;
use clap::Parser;
use heightmap::{
    demfile::{gl1, Gl1Tile, TileKey},
    HeightReader, HeightmapConfig, Profile, StackReader,
};
use log::debug;
use options::{Cli, Command as CliCmd, LatLon, ProfileOutput};
use serde::Serialize;
use std::io::Write;
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    let Cli {
        config,
        srtm_dir,
        omhm,
        cache_size,
        precision,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let mut config = match config {
        Some(path) => HeightmapConfig::from_json_file(path)?,
        None => HeightmapConfig::default(),
    };
    if srtm_dir.is_some() {
        config.srtm_dir = srtm_dir;
    }
    if !omhm.is_empty() {
        config.omhm = omhm;
    }
    if let Some(cache_size) = cache_size {
        config.cache_size = cache_size;
    }
    debug!("{config:?}");

    match cmd {
        CliCmd::Point { at } => point(&config.build_stack()?, at, precision),
        CliCmd::Profile {
            start,
            dest,
            step,
            start_alt,
            dest_alt,
            out,
        } => {
            let mut builder = Profile::builder()
                .start(start.0.into())
                .end(dest.0.into())
                .precision(precision);
            if let Some(step) = step {
                builder = builder.step_size(step);
            }
            if let Some(start_alt) = start_alt {
                builder = builder.start_alt(start_alt);
            }
            if let Some(dest_alt) = dest_alt {
                builder = builder.end_alt(dest_alt);
            }
            let profile = builder.build(&config.build_stack()?)?;
            match out {
                ProfileOutput::Display => display(&profile),
                ProfileOutput::Json => json(&profile),
                ProfileOutput::Plot => {
                    plot_ascii(&profile);
                    Ok(())
                }
            }
        }
        CliCmd::Matrix {
            nw,
            se,
            size,
            default,
        } => matrix(&config.build_stack()?, nw, se, size, precision, default),
        CliCmd::Tile { path } => tile(&path),
        CliCmd::Pack { src, dst_dir } => {
            let path = gl1::pack_hgt(src, dst_dir)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn point(stack: &StackReader, LatLon(at): LatLon, precision: f64) -> Result<(), AnyError> {
    match stack.read_altitude(at.into(), precision).get() {
        Some(meters) => println!("{meters}"),
        None => println!("no data"),
    }
    Ok(())
}

fn display(profile: &Profile) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    for ((pos, distance), elevation) in profile
        .great_circle
        .iter()
        .zip(profile.distances.iter())
        .zip(profile.terrain.iter())
    {
        writeln!(
            stdout,
            "{distance:10.1}: {:.6},{:.6} {elevation:.1}",
            pos.lat, pos.lon
        )?;
    }
    Ok(())
}

fn json(profile: &Profile) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonEntry {
        location: [f64; 2],
        distance: f64,
        elevation: f64,
    }

    let reshaped: Vec<JsonEntry> = profile
        .great_circle
        .iter()
        .zip(profile.distances.iter())
        .zip(profile.terrain.iter())
        .map(|((pos, distance), elevation)| JsonEntry {
            location: [pos.lon, pos.lat],
            distance: *distance,
            elevation: *elevation,
        })
        .collect();
    let json = serde_json::to_string(&reshaped)?;
    println!("{json}");
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn plot_ascii(profile: &Profile) {
    let plot_data: Vec<(f32, f32)> = profile
        .distances
        .iter()
        .zip(profile.terrain.iter())
        .map(|(distance, elevation)| (*distance as f32, *elevation as f32))
        .collect();
    Chart::new(300, 150, 0.0, profile.distance as f32)
        .lineplot(&Shape::Lines(&plot_data))
        .display();
}

#[allow(clippy::cast_precision_loss)]
fn linspace(from: f64, to: f64, size: usize) -> Vec<f64> {
    match size {
        0 => Vec::new(),
        1 => vec![from],
        _ => {
            let step = (to - from) / (size - 1) as f64;
            (0..size).map(|i| step.mul_add(i as f64, from)).collect()
        }
    }
}

fn matrix(
    stack: &StackReader,
    LatLon(nw): LatLon,
    LatLon(se): LatLon,
    size: usize,
    precision: f64,
    default: f64,
) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonMatrix {
        lats: Vec<f64>,
        lons: Vec<f64>,
        /// Row-major over `lats`.
        altitudes: Vec<f64>,
    }

    let lats = linspace(nw.y, se.y, size);
    let lons = linspace(nw.x, se.x, size);
    let altitudes = stack.altitude_matrix(&lats, &lons, precision, default);
    let json = serde_json::to_string(&JsonMatrix {
        lats,
        lons,
        altitudes,
    })?;
    println!("{json}");
    Ok(())
}

fn tile(path: &std::path::Path) -> Result<(), AnyError> {
    let key = TileKey::from_file_name(path)?;
    let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let tile = Gl1Tile::load(dir, key)?;
    let fmt = |v: Option<i16>| v.map_or_else(|| "none".to_owned(), |v| v.to_string());
    println!("tile:      {key:?}");
    println!("min:       {}", fmt(tile.min_elevation()));
    println!("max:       {}", fmt(tile.max_elevation()));
    println!("northwest: {}", fmt(tile.raw_sample(0.0, 0.0).get()));
    println!("southeast: {}", fmt(tile.raw_sample(1.0, 1.0).get()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::linspace;

    #[test]
    fn test_linspace() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert_eq!(linspace(45.0, 44.0, 3), vec![45.0, 44.5, 44.0]);
    }
}
