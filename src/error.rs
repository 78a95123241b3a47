//! Centralized error type for the blockhost umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use blockhost_core::ReturnCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] blockhost_core::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] blockhost_midi::Error),

    #[error("Plugin: {0}")]
    Plugin(#[from] blockhost_plugin::Error),

    #[error("Audio I/O: {0}")]
    Io(#[from] blockhost_io::Error),

    #[error("Missing required option: {0}")]
    MissingRequiredOption(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Orchestrator used out of order: {0}")]
    InvalidState(String),

    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

impl Error {
    /// Exit code the binary reports for this error.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            Error::Core(_) | Error::InvalidArgument(_) => ReturnCode::InvalidArgument,
            Error::Midi(blockhost_midi::Error::Unsupported(_))
            | Error::Midi(blockhost_midi::Error::MidiUnsupportedTiming) => {
                ReturnCode::UnsupportedFeature
            }
            Error::Midi(_) => ReturnCode::IoError,
            Error::Plugin(e) => e.return_code(),
            Error::Io(blockhost_io::Error::UnsupportedFormat(_)) => ReturnCode::UnsupportedFeature,
            Error::Io(blockhost_io::Error::InvalidOptions(_)) => ReturnCode::InvalidArgument,
            Error::Io(_) | Error::StdIo(_) => ReturnCode::IoError,
            Error::MissingRequiredOption(_) => ReturnCode::MissingRequiredOption,
            Error::InvalidState(_) => ReturnCode::InternalError,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
