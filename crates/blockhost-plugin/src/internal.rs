//! Built-in plugins, addressed by names starting with `mrs_`.

use crate::error::{Error, Result};
use crate::handle::{PluginSetting, PluginType};
use blockhost_core::SampleBuffer;
use tracing::info;

pub const INTERNAL_PREFIX: &str = "mrs_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalKind {
    /// Copies input to output.
    Passthru,
    /// Instrument that only ever produces silence.
    Silence,
    /// Scales input by parameter 0.
    Gain,
    /// Hard clips to [-1, 1].
    Limiter,
}

impl InternalKind {
    pub const ALL: [InternalKind; 4] = [
        InternalKind::Passthru,
        InternalKind::Silence,
        InternalKind::Gain,
        InternalKind::Limiter,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InternalKind::Passthru => "mrs_passthru",
            InternalKind::Silence => "mrs_silence",
            InternalKind::Gain => "mrs_gain",
            InternalKind::Limiter => "mrs_limiter",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            InternalKind::Passthru => "Copies input to output",
            InternalKind::Silence => "Instrument that generates silence",
            InternalKind::Gain => "Multiplies input by parameter 0 (default 1.0)",
            InternalKind::Limiter => "Clamps every sample to [-1, 1]",
        }
    }
}

#[derive(Debug, Clone)]
pub struct InternalPlugin {
    kind: InternalKind,
    gain: f32,
    is_open: bool,
}

impl InternalPlugin {
    pub fn new(kind: InternalKind) -> Self {
        Self {
            kind,
            gain: 1.0,
            is_open: false,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        InternalKind::from_name(name).map(Self::new)
    }

    pub fn kind(&self) -> InternalKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn plugin_type(&self) -> PluginType {
        match self.kind {
            InternalKind::Silence => PluginType::Instrument,
            _ => PluginType::Effect,
        }
    }

    pub fn open(&mut self) {
        self.is_open = true;
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn process_audio(&mut self, input: &SampleBuffer, output: &mut SampleBuffer) {
        match self.kind {
            InternalKind::Passthru => output.copy_from(input),
            InternalKind::Silence => output.clear(),
            InternalKind::Gain => {
                output.copy_from(input);
                let gain = self.gain;
                for channel in output.channels_mut() {
                    channel.iter_mut().for_each(|s| *s *= gain);
                }
            }
            InternalKind::Limiter => {
                output.copy_from(input);
                for channel in output.channels_mut() {
                    channel.iter_mut().for_each(|s| *s = s.clamp(-1.0, 1.0));
                }
            }
        }
    }

    pub fn get_setting(&self, setting: PluginSetting) -> u64 {
        match setting {
            PluginSetting::TailTimeMs | PluginSetting::InitialDelayFrames => 0,
            PluginSetting::NumInputs => match self.kind {
                InternalKind::Silence => 0,
                _ => 2,
            },
            PluginSetting::NumOutputs => 2,
        }
    }

    pub fn num_params(&self) -> usize {
        match self.kind {
            InternalKind::Gain => 1,
            _ => 0,
        }
    }

    pub fn set_parameter(&mut self, index: usize, value: f32) -> Result<()> {
        match (self.kind, index) {
            (InternalKind::Gain, 0) => {
                self.gain = value;
                Ok(())
            }
            _ => Err(Error::InvalidParameter {
                plugin: self.name().to_string(),
                index,
            }),
        }
    }

    pub fn get_parameter(&self, index: usize) -> Option<f32> {
        match (self.kind, index) {
            (InternalKind::Gain, 0) => Some(self.gain),
            _ => None,
        }
    }

    pub fn display_info(&self) {
        info!("Information for internal plugin '{}'", self.name());
        info!("  Type: {}", self.plugin_type());
        info!("  Description: {}", self.kind.description());
        if let Some(gain) = self.get_parameter(0) {
            info!("  Parameters (1):");
            info!("    0: gain = {:.6}", gain);
        }
    }
}

/// Logs every built-in plugin.
pub fn list_internal_plugins() {
    info!("Internal plugins:");
    for kind in InternalKind::ALL {
        info!("  {}: {}", kind.name(), kind.description());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(value: f32) -> SampleBuffer {
        let mut buffer = SampleBuffer::new(2, 8);
        buffer.channel_mut(0).fill(value);
        buffer.channel_mut(1).fill(-value);
        buffer
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(
            InternalPlugin::from_name("mrs_gain").map(|p| p.kind()),
            Some(InternalKind::Gain)
        );
        assert!(InternalPlugin::from_name("mrs_reverb").is_none());
        assert!(InternalPlugin::from_name("passthru").is_none());
    }

    #[test]
    fn test_passthru_copies() {
        let mut plugin = InternalPlugin::new(InternalKind::Passthru);
        let input = signal(0.3);
        let mut output = SampleBuffer::new(2, 8);
        plugin.process_audio(&input, &mut output);
        assert_eq!(output, input);
    }

    #[test]
    fn test_silence_is_instrument() {
        let mut plugin = InternalPlugin::new(InternalKind::Silence);
        assert_eq!(plugin.plugin_type(), PluginType::Instrument);
        assert_eq!(plugin.get_setting(PluginSetting::NumInputs), 0);
        let mut output = signal(1.0);
        plugin.process_audio(&signal(0.5), &mut output);
        assert!(output.channel(0).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_gain_halves_input() {
        let mut plugin = InternalPlugin::new(InternalKind::Gain);
        plugin.set_parameter(0, 0.5).unwrap();
        assert!(plugin.set_parameter(1, 0.5).is_err());

        let mut output = SampleBuffer::new(2, 8);
        plugin.process_audio(&signal(0.8), &mut output);
        approx::assert_relative_eq!(output.channel(0)[3], 0.4);
        approx::assert_relative_eq!(output.channel(1)[3], -0.4);
    }

    #[test]
    fn test_limiter_clamps() {
        let mut plugin = InternalPlugin::new(InternalKind::Limiter);
        let mut input = SampleBuffer::new(2, 8);
        input.channel_mut(0).fill(1.5);
        input.channel_mut(1).fill(-3.0);
        let mut output = SampleBuffer::new(2, 8);
        plugin.process_audio(&input, &mut output);
        assert_eq!(output.channel(0)[0], 1.0);
        assert_eq!(output.channel(1)[0], -1.0);
        assert!(plugin.set_parameter(0, 1.0).is_err());
    }

    #[test]
    fn test_no_tail() {
        for kind in InternalKind::ALL {
            let plugin = InternalPlugin::new(kind);
            assert_eq!(plugin.get_setting(PluginSetting::TailTimeMs), 0);
            assert_eq!(plugin.get_setting(PluginSetting::InitialDelayFrames), 0);
        }
    }
}
