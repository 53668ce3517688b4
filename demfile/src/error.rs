use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tile name {}", .0.display())]
    TileName(PathBuf),

    #[error("failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("invalid {format} file: {reason}")]
    Format {
        format: &'static str,
        reason: String,
    },

    #[error("({lat}, {lon}) is outside raster coverage")]
    OutOfCoverage { lat: f64, lon: f64 },

    #[error("no data")]
    NoData,
}

impl DemError {
    pub(crate) fn decode<P: Into<PathBuf>, S: ToString>(path: P, reason: S) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn format<S: ToString>(format: &'static str, reason: S) -> Self {
        Self::Format {
            format,
            reason: reason.to_string(),
        }
    }
}
