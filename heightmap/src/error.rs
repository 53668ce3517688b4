use demfile::DemError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeightmapError {
    #[error("missing required parameters")]
    Builder,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no elevation data directory at {}", .0.display())]
    Path(PathBuf),

    #[error("{0}")]
    Dem(#[from] DemError),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}
