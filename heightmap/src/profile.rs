//! Terrain profiles along geodesics.

use crate::{
    geodesic::Inverse,
    reader::{HeightReader, AUTOSTEP_M},
    HeightmapError,
};
use demfile::LatLon;
use log::debug;

/// One profile sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionAndDistance {
    pub position: LatLon,
    /// Ground elevation in meters, 0 where there is no data.
    pub altitude: f64,
    /// Meters from the start along the geodesic.
    pub distance: f64,
}

/// A profile sample reduced to (distance, altitude).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePoint {
    pub distance: f64,
    pub altitude: f64,
}

/// Walks the geodesic from `p1` to `p2`, yielding
/// `(position, distance, altitude)` at `0, step, 2·step, …` while
/// below the total distance, then `p2` itself.
///
/// Coincident or non-finite endpoints yield a single sample at `p1`.
/// A non-positive or non-finite `step` yields nothing.
pub(crate) fn walk<R: HeightReader + ?Sized>(
    reader: &R,
    p1: LatLon,
    p2: LatLon,
    step: f64,
    precision: f64,
) -> Walk<'_, R> {
    let Inverse {
        distance, azimuth1, ..
    } = reader.geodesic().inverse(p1, p2);
    let stage = if !distance.is_normal() {
        Stage::Single
    } else if !step.is_normal() || step < 0.0 || !(distance / step).is_normal() {
        Stage::Done
    } else {
        Stage::Step(0)
    };
    Walk {
        reader,
        start: p1,
        end: p2,
        azimuth: azimuth1,
        distance,
        step,
        precision,
        stage,
    }
}

pub(crate) struct Walk<'a, R: ?Sized> {
    reader: &'a R,
    start: LatLon,
    end: LatLon,
    azimuth: f64,
    distance: f64,
    step: f64,
    precision: f64,
    stage: Stage,
}

#[derive(Clone, Copy)]
enum Stage {
    Single,
    Step(u64),
    Done,
}

impl<'a, R: HeightReader + ?Sized> Walk<'a, R> {
    fn sample(&self, pos: LatLon, distance: f64) -> (LatLon, f64, f64) {
        let altitude = self.reader.read_altitude(pos, self.precision).unwrap_or(0.0);
        (pos, distance, altitude)
    }
}

impl<'a, R: HeightReader + ?Sized> Iterator for Walk<'a, R> {
    type Item = (LatLon, f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        match self.stage {
            Stage::Done => None,
            Stage::Single => {
                self.stage = Stage::Done;
                Some(self.sample(self.start, 0.0))
            }
            Stage::Step(index) => {
                #[allow(clippy::cast_precision_loss)]
                let along = index as f64 * self.step;
                if along < self.distance {
                    self.stage = Stage::Step(index + 1);
                    let pos = if index == 0 {
                        self.start
                    } else {
                        self.reader
                            .geodesic()
                            .direct(self.start, self.azimuth, along)
                    };
                    Some(self.sample(pos, along))
                } else {
                    self.stage = Stage::Done;
                    Some(self.sample(self.end, self.distance))
                }
            }
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.stage {
            Stage::Done => (0, Some(0)),
            Stage::Single => (1, Some(1)),
            Stage::Step(index) => {
                // Rounding in `index·step` can shift the step count by one.
                let steps = (self.distance / self.step).ceil() as usize;
                let remaining = steps.saturating_sub(index as usize);
                (remaining, Some(remaining + 2))
            }
        }
    }
}

/// Columnar terrain profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Total geodesic distance from start to end in meters.
    pub distance: f64,

    /// Location of each sample.
    pub great_circle: Vec<LatLon>,

    /// Distance of each sample from the start in meters.
    pub distances: Vec<f64>,

    /// Elevation at each sample, including any start/end heights above
    /// ground.
    pub terrain: Vec<f64>,
}

impl Profile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.terrain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terrain.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileBuilder {
    start: Option<LatLon>,

    end: Option<LatLon>,

    /// Maximum distance between points, defaults to [`AUTOSTEP_M`].
    step_size_m: Option<f64>,

    /// Resolution hint passed to the reader, arc-seconds.
    precision: f64,

    /// Height above ground at the start (meters).
    start_alt_m: Option<f64>,

    /// Height above ground at the end (meters).
    end_alt_m: Option<f64>,
}

impl ProfileBuilder {
    pub fn start(mut self, pos: LatLon) -> Self {
        self.start = Some(pos);
        self
    }

    pub fn start_alt(mut self, meters: f64) -> Self {
        self.start_alt_m = Some(meters);
        self
    }

    pub fn step_size(mut self, meters: f64) -> Self {
        self.step_size_m = Some(meters);
        self
    }

    pub fn precision(mut self, arc_seconds: f64) -> Self {
        self.precision = arc_seconds;
        self
    }

    pub fn end(mut self, pos: LatLon) -> Self {
        self.end = Some(pos);
        self
    }

    pub fn end_alt(mut self, meters: f64) -> Self {
        self.end_alt_m = Some(meters);
        self
    }

    pub fn build<R: HeightReader + ?Sized>(&self, reader: &R) -> Result<Profile, HeightmapError> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(HeightmapError::Builder);
        };
        let step_size_m = self.step_size_m.unwrap_or(AUTOSTEP_M);

        let now = std::time::Instant::now();
        let walk = walk(reader, start, end, step_size_m, self.precision);
        let (lower, _) = walk.size_hint();
        let mut great_circle = Vec::with_capacity(lower);
        let mut distances = Vec::with_capacity(lower);
        let mut terrain = Vec::with_capacity(lower);
        for (pos, distance, altitude) in walk {
            great_circle.push(pos);
            distances.push(distance);
            terrain.push(altitude);
        }

        // Add optional height above ground for start point.
        if let (Some(elev), Some(start_alt_m)) = (terrain.first_mut(), self.start_alt_m) {
            *elev += start_alt_m;
        };

        // Add optional height above ground for end point.
        if let (Some(elev), Some(end_alt_m)) = (terrain.last_mut(), self.end_alt_m) {
            *elev += end_alt_m;
        };

        debug!(
            "profile; len: {}, exec: {:?}",
            great_circle.len(),
            now.elapsed()
        );

        Ok(Profile {
            distance: distances.last().copied().unwrap_or(0.0),
            great_circle,
            distances,
            terrain,
        })
    }
}
