//! Run-level options: everything a run needs besides the audio settings.

use crate::{Error, Result};
use blockhost_io::{BitDepth, Endianness};
use std::path::PathBuf;
use std::str::FromStr;

/// Default output path when none is given.
pub const DEFAULT_OUTPUT: &str = "out.wav";

/// One `index,value` parameter assignment for the first plugin in the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSetting {
    pub index: usize,
    pub value: f32,
}

impl FromStr for ParameterSetting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (index, value) = s
            .split_once(',')
            .ok_or_else(|| Error::InvalidArgument(format!("parameter '{}' is not 'index,value'", s)))?;
        let index = index
            .trim()
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("bad parameter index in '{}'", s)))?;
        let value: f32 = value
            .trim()
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("bad parameter value in '{}'", s)))?;
        if !value.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "parameter value in '{}' is not finite",
                s
            )));
        }
        Ok(Self { index, value })
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Chain string, `name[,preset][;name[,preset]]...`.
    pub plugin_chain: String,
    pub plugin_root: Option<PathBuf>,
    /// Input path; `None` runs from silence.
    pub input: Option<String>,
    pub output: String,
    pub midi_file: Option<PathBuf>,
    pub parameters: Vec<ParameterSetting>,
    pub max_time_ms: Option<u64>,
    /// Extra tail on top of what the chain asks for.
    pub tail_time_ms: u64,
    pub bit_depth: BitDepth,
    pub endianness: Endianness,
    pub display_info: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            plugin_chain: String::new(),
            plugin_root: None,
            input: None,
            output: DEFAULT_OUTPUT.to_string(),
            midi_file: None,
            parameters: Vec::new(),
            max_time_ms: None,
            tail_time_ms: 0,
            bit_depth: BitDepth::Int16,
            endianness: Endianness::Little,
            display_info: false,
        }
    }
}

impl RunConfig {
    pub fn new(plugin_chain: impl Into<String>) -> Self {
        Self {
            plugin_chain: plugin_chain.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.plugin_chain.trim().is_empty() {
            return Err(Error::MissingRequiredOption(
                "a plugin chain (--plugin) is required".to_string(),
            ));
        }
        if self.display_info {
            return Ok(());
        }
        if self.output.is_empty() {
            return Err(Error::MissingRequiredOption(
                "an output path (--output) is required".to_string(),
            ));
        }
        if self.input.is_none() && self.midi_file.is_none() && self.max_time_ms.is_none() {
            return Err(Error::MissingRequiredOption(
                "without an input file, a MIDI file or --max-time is needed to end the run"
                    .to_string(),
            ));
        }
        if self.max_time_ms == Some(0) {
            return Err(Error::InvalidArgument("max time must be above 0 ms".to_string()));
        }
        if self.input.as_deref() == Some("-") && self.output == "-" {
            tracing::warn!("Reading and writing raw PCM on stdin/stdout");
        }
        Ok(())
    }
}
