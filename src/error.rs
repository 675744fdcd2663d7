use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Invalid quality value: {0}. Must be between {1} and {2}")]
    InvalidQuality(u8, u8, u8),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Worker panicked while processing {0:?}")]
    Panicked(PathBuf),
}

impl ResizeError {
    pub fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        ResizeError::Decode {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResizeError::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResizeError>;
