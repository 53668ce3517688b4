//! Elevation value types.

use std::fmt;

/// Sample value SRTM uses to mark voids.
pub const VOID_SAMPLE: i16 = i16::MIN;

/// An elevation in meters, or nothing.
///
/// Stored as a single `f64` with NaN standing in for "no data", so
/// matrices and profiles of altitudes stay as compact as plain floats.
#[derive(Clone, Copy)]
pub struct Altitude(f64);

impl Altitude {
    /// The "no data" altitude.
    pub const NONE: Self = Self(f64::NAN);

    /// Returns an altitude for `meters`.
    ///
    /// A NaN input is indistinguishable from [`Altitude::NONE`].
    pub const fn new(meters: f64) -> Self {
        Self(meters)
    }

    pub fn is_none(self) -> bool {
        self.0.is_nan()
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    pub fn get(self) -> Option<f64> {
        if self.is_none() {
            None
        } else {
            Some(self.0)
        }
    }

    pub fn unwrap_or(self, default: f64) -> f64 {
        self.get().unwrap_or(default)
    }

    /// Returns `self` if it holds a value, otherwise calls `f`.
    pub fn or_else<F: FnOnce() -> Self>(self, f: F) -> Self {
        if self.is_none() {
            f()
        } else {
            self
        }
    }
}

impl From<Option<f64>> for Altitude {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::NONE, Self)
    }
}

impl From<Altitude> for Option<f64> {
    fn from(altitude: Altitude) -> Self {
        altitude.get()
    }
}

impl PartialEq for Altitude {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl fmt::Debug for Altitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(meters) => write!(f, "Altitude({meters})"),
            None => f.write_str("Altitude(None)"),
        }
    }
}

/// A raster-native 16-bit sample, with [`VOID_SAMPLE`] meaning "no
/// data".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample(i16);

impl RawSample {
    pub const NONE: Self = Self(VOID_SAMPLE);

    pub const fn new(meters: i16) -> Self {
        Self(meters)
    }

    pub fn is_none(self) -> bool {
        self.0 == VOID_SAMPLE
    }

    pub fn get(self) -> Option<i16> {
        if self.is_none() {
            None
        } else {
            Some(self.0)
        }
    }

    /// Returns the stored value, including the void sentinel.
    pub fn raw(self) -> i16 {
        self.0
    }
}

impl From<RawSample> for Altitude {
    fn from(sample: RawSample) -> Self {
        sample.get().map(f64::from).into()
    }
}
