//! Error types for blockhost-io

use std::io;
use thiserror::Error;

/// Audio I/O error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported format or feature not enabled
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid source or sink options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Source or sink used before `open` or after `close`
    #[error("'{0}' is not open")]
    NotOpen(String),
}

/// Result type for audio I/O operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "wav")]
impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io_err) => Error::Io(io_err),
            hound::Error::Unsupported => Error::UnsupportedFormat("WAVE variant".into()),
            other => Error::Io(io::Error::other(other)),
        }
    }
}
