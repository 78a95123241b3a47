//! Error and exit-code types for blockhost-core.

use thiserror::Error;

/// Error type for blockhost-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid time signature: {0}")]
    InvalidTimeSignature(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes reported by a run.
///
/// The numeric values are stable and form part of the command-line contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReturnCode {
    Success = 0,
    NotRun = 1,
    InvalidArgument = 2,
    MissingRequiredOption = 3,
    IoError = 4,
    PluginError = 5,
    InvalidPluginChain = 6,
    UnsupportedFeature = 7,
    InternalError = 8,
}

impl ReturnCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self == ReturnCode::Success
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReturnCode::Success => "success",
            ReturnCode::NotRun => "not run",
            ReturnCode::InvalidArgument => "invalid argument",
            ReturnCode::MissingRequiredOption => "missing required option",
            ReturnCode::IoError => "I/O error",
            ReturnCode::PluginError => "plugin error",
            ReturnCode::InvalidPluginChain => "invalid plugin chain",
            ReturnCode::UnsupportedFeature => "unsupported feature",
            ReturnCode::InternalError => "internal error",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

impl From<ReturnCode> for std::process::ExitCode {
    fn from(code: ReturnCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}
