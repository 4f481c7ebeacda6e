/// Error types shared by the core library
use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or decode a texture image
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to read texture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported image format (expected PPM P3 or P6)")]
    UnsupportedFormat,

    #[error("malformed PPM header: {0}")]
    Header(String),

    #[error("invalid image dimensions {width}x{height}")]
    Dimensions { width: u32, height: u32 },

    #[error("pixel data truncated: expected {expected} samples, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("pixel buffer has {found} bytes, expected {expected} for RGBA")]
    BufferSize { expected: usize, found: usize },
}

/// Failure to load configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
