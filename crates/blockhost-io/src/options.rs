//! Format selection and encoding options.

use crate::{Error, Result};
use std::path::Path;
use std::str::FromStr;

/// Output bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    Int16,
    Int24,
    Float32,
}

impl BitDepth {
    /// Bits per sample.
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }

    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            16 => Ok(BitDepth::Int16),
            24 => Ok(BitDepth::Int24),
            32 => Ok(BitDepth::Float32),
            other => Err(Error::InvalidOptions(format!(
                "unsupported bit depth {} (expected 16, 24 or 32)",
                other
            ))),
        }
    }
}

/// Byte order for raw PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl FromStr for Endianness {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(Endianness::Little),
            "big" | "be" => Ok(Endianness::Big),
            other => Err(Error::InvalidOptions(format!("unknown endianness '{}'", other))),
        }
    }
}

/// Raw PCM layout. Only 16-bit signed samples are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmOptions {
    pub channels: usize,
    pub sample_rate: u32,
    pub endianness: Endianness,
}

impl Default for PcmOptions {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 44100,
            endianness: Endianness::Little,
        }
    }
}

/// Container guessed from a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wave,
    Pcm,
    /// `-`: raw PCM on stdin or stdout.
    Stdio,
}

impl AudioFormat {
    pub fn guess(path: &str) -> Result<Self> {
        if path == "-" {
            return Ok(AudioFormat::Stdio);
        }
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("wav") | Some("wave") => Ok(AudioFormat::Wave),
            Some("pcm") | Some("raw") => Ok(AudioFormat::Pcm),
            Some(other) => Err(Error::UnsupportedFormat(format!(".{} ({})", other, path))),
            None => Err(Error::UnsupportedFormat(format!(
                "no file extension on '{}'",
                path
            ))),
        }
    }
}
