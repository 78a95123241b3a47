//! Error types for plugin hosting

use blockhost_core::ReturnCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Discovery,
    Loading,
    EntryPoint,
    Magic,
    Initialization,
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStage::Discovery => write!(f, "locating module"),
            LoadStage::Loading => write!(f, "loading library"),
            LoadStage::EntryPoint => write!(f, "calling entry point"),
            LoadStage::Magic => write!(f, "checking magic"),
            LoadStage::Initialization => write!(f, "initializing plugin"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Plugin '{0}' could not be found")]
    NotFound(String),

    #[error("Plugin load failed at {stage} stage: {path}\n  Reason: {reason}")]
    LoadFailed {
        path: PathBuf,
        stage: LoadStage,
        reason: String,
    },

    #[error("Plugin '{name}' is {kind} and cannot be processed")]
    UnsupportedPluginType { name: String, kind: String },

    #[error("Invalid plugin chain: {0}")]
    InvalidChain(String),

    #[error("Invalid chain string: {0}")]
    InvalidChainString(String),

    #[error("Invalid preset '{0}'")]
    InvalidPreset(String),

    #[error("Preset '{preset}' is not compatible with plugin '{plugin}'")]
    IncompatiblePreset { preset: String, plugin: String },

    #[error("Failed to load preset '{preset}': {reason}")]
    PresetLoad { preset: String, reason: String },

    #[error("Plugin '{plugin}' has no parameter {index}")]
    InvalidParameter { plugin: String, index: usize },

    #[error("Plugin '{0}' is not open")]
    NotOpen(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this failure.
    pub fn return_code(&self) -> ReturnCode {
        match self {
            Error::NotFound(_)
            | Error::LoadFailed { .. }
            | Error::UnsupportedPluginType { .. }
            | Error::PresetLoad { .. }
            | Error::NotOpen(_) => ReturnCode::PluginError,
            Error::InvalidChain(_) => ReturnCode::InvalidPluginChain,
            Error::InvalidChainString(_)
            | Error::InvalidPreset(_)
            | Error::IncompatiblePreset { .. }
            | Error::InvalidParameter { .. } => ReturnCode::InvalidArgument,
            Error::Unsupported(_) => ReturnCode::UnsupportedFeature,
            Error::Io(_) => ReturnCode::IoError,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_stage_display() {
        assert_eq!(LoadStage::Discovery.to_string(), "locating module");
        assert_eq!(LoadStage::EntryPoint.to_string(), "calling entry point");
        assert_eq!(LoadStage::Magic.to_string(), "checking magic");
    }

    #[test]
    fn test_error_display() {
        let err = Error::LoadFailed {
            path: PathBuf::from("/tmp/reverb.so"),
            stage: LoadStage::Magic,
            reason: "bad magic 0x0".to_string(),
        };
        assert!(err.to_string().contains("checking magic"));
        assert!(err.to_string().contains("reverb.so"));

        let err = Error::InvalidParameter {
            plugin: "mrs_gain".into(),
            index: 3,
        };
        assert_eq!(err.to_string(), "Plugin 'mrs_gain' has no parameter 3");
    }

    #[test]
    fn test_return_codes() {
        assert_eq!(
            Error::InvalidChain("x".into()).return_code(),
            ReturnCode::InvalidPluginChain
        );
        assert_eq!(
            Error::NotFound("x".into()).return_code(),
            ReturnCode::PluginError
        );
        assert_eq!(
            Error::IncompatiblePreset {
                preset: "1".into(),
                plugin: "mrs_gain".into()
            }
            .return_code(),
            ReturnCode::InvalidArgument
        );
        assert_eq!(
            Error::Unsupported("sysex".into()).return_code(),
            ReturnCode::UnsupportedFeature
        );
    }
}
