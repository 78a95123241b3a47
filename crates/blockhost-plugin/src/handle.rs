//! One unit of work in a plugin chain.

use crate::error::{Error, Result};
use crate::internal::{InternalPlugin, INTERNAL_PREFIX};
use crate::vst2::{HostContext, Vst2Plugin};
use blockhost_core::SampleBuffer;
use blockhost_midi::MidiEvent;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Classification, known only after the plugin has been opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginType {
    Unknown,
    Effect,
    Instrument,
    Unsupported,
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginType::Unknown => write!(f, "unknown"),
            PluginType::Effect => write!(f, "effect"),
            PluginType::Instrument => write!(f, "instrument"),
            PluginType::Unsupported => write!(f, "unsupported"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginSetting {
    TailTimeMs,
    NumInputs,
    NumOutputs,
    InitialDelayFrames,
}

/// A native VST2 module or a built-in.
pub enum PluginHandle {
    Vst2(Vst2Plugin),
    Internal(InternalPlugin),
}

impl PluginHandle {
    /// Builds an unopened handle for `name`.
    ///
    /// `mrs_` names must match a built-in; anything else is treated as a
    /// VST2 module and located when opened.
    pub fn new(name: &str, plugin_root: Option<&Path>, host: Arc<HostContext>) -> Result<Self> {
        if name.starts_with(INTERNAL_PREFIX) {
            return InternalPlugin::from_name(name)
                .map(PluginHandle::Internal)
                .ok_or_else(|| Error::NotFound(name.to_string()));
        }
        Ok(PluginHandle::Vst2(Vst2Plugin::new(name, plugin_root, host)))
    }

    pub fn name(&self) -> &str {
        match self {
            PluginHandle::Vst2(plugin) => plugin.name(),
            PluginHandle::Internal(plugin) => plugin.name(),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, PluginHandle::Vst2(_))
    }

    pub fn plugin_type(&self) -> PluginType {
        match self {
            PluginHandle::Vst2(plugin) => plugin.plugin_type(),
            PluginHandle::Internal(plugin) => plugin.plugin_type(),
        }
    }

    pub fn open(&mut self) -> Result<()> {
        match self {
            PluginHandle::Vst2(plugin) => plugin.open(),
            PluginHandle::Internal(plugin) => {
                plugin.open();
                Ok(())
            }
        }
    }

    pub fn is_open(&self) -> bool {
        match self {
            PluginHandle::Vst2(plugin) => plugin.is_open(),
            PluginHandle::Internal(plugin) => plugin.is_open(),
        }
    }

    pub fn close(&mut self) {
        match self {
            PluginHandle::Vst2(plugin) => plugin.close(),
            PluginHandle::Internal(plugin) => plugin.close(),
        }
    }

    /// Fills `output` from `input`. Both buffers already hold at least the
    /// plugin's declared channel counts.
    pub fn process_audio(&mut self, input: &mut SampleBuffer, output: &mut SampleBuffer) {
        match self {
            PluginHandle::Vst2(plugin) => plugin.process_audio(input, output),
            PluginHandle::Internal(plugin) => plugin.process_audio(input, output),
        }
    }

    pub fn process_midi(&mut self, events: &[MidiEvent]) {
        match self {
            PluginHandle::Vst2(plugin) => plugin.process_midi(events),
            // Built-ins have no use for MIDI.
            PluginHandle::Internal(_) => {}
        }
    }

    pub fn get_setting(&self, setting: PluginSetting) -> u64 {
        match self {
            PluginHandle::Vst2(plugin) => plugin.get_setting(setting),
            PluginHandle::Internal(plugin) => plugin.get_setting(setting),
        }
    }

    pub fn set_parameter(&mut self, index: usize, value: f32) -> Result<()> {
        match self {
            PluginHandle::Vst2(plugin) => plugin.set_parameter(index, value),
            PluginHandle::Internal(plugin) => plugin.set_parameter(index, value),
        }
    }

    pub fn get_parameter(&self, index: usize) -> Option<f32> {
        match self {
            PluginHandle::Vst2(plugin) => plugin.get_parameter(index),
            PluginHandle::Internal(plugin) => plugin.get_parameter(index),
        }
    }

    pub fn display_info(&self) {
        match self {
            PluginHandle::Vst2(plugin) => plugin.display_info(),
            PluginHandle::Internal(plugin) => plugin.display_info(),
        }
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("name", &self.name())
            .field("native", &self.is_native())
            .field("type", &self.plugin_type())
            .finish()
    }
}
