use std::path::PathBuf;
use thiserror::Error;

pub type StatsResult<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has no samples")]
    Empty,
}

impl StatsError {
    /// Whether the underlying failure is a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            StatsError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
