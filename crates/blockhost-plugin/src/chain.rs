//! Ordered, strictly serial plugin chain.

use crate::error::{Error, Result};
use crate::handle::{PluginHandle, PluginSetting, PluginType};
use crate::preset::PluginPreset;
use crate::vst2::HostContext;
use blockhost_core::{SampleBuffer, TaskTimer, TransportSnapshot};
use blockhost_midi::MidiEvent;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Most plugins a chain will hold.
pub const MAX_CHAIN_LENGTH: usize = 8;

struct ChainEntry {
    handle: PluginHandle,
    preset: Option<PluginPreset>,
    audio_timer: TaskTimer,
    midi_timer: TaskTimer,
}

/// Splits `"name[,preset][;name[,preset]]..."` into its entries.
pub fn parse_chain_string(chain: &str) -> Result<Vec<(String, Option<String>)>> {
    let entries: Vec<(String, Option<String>)> = chain
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(',') {
            Some((name, preset)) => (name.trim().to_string(), Some(preset.trim().to_string())),
            None => (entry.to_string(), None),
        })
        .collect();

    if entries.is_empty() {
        return Err(Error::InvalidChainString("no plugins given".to_string()));
    }
    if let Some((name, _)) = entries.iter().find(|(name, _)| name.is_empty()) {
        return Err(Error::InvalidChainString(format!("empty plugin name in '{}'", name)));
    }
    Ok(entries)
}

/// Plugins run in order, each stage's output feeding the next stage's input.
pub struct PluginChain {
    entries: Vec<ChainEntry>,
    host: Arc<HostContext>,
}

impl PluginChain {
    pub fn new(host: Arc<HostContext>) -> Self {
        Self {
            entries: Vec::with_capacity(MAX_CHAIN_LENGTH),
            host,
        }
    }

    /// Builds an unopened chain from a chain string such as
    /// `"Reverb,hall.fxp;mrs_limiter"`.
    pub fn from_chain_string(
        chain: &str,
        plugin_root: Option<&Path>,
        host: Arc<HostContext>,
    ) -> Result<Self> {
        let mut plugin_chain = Self::new(Arc::clone(&host));
        for (name, preset) in parse_chain_string(chain)? {
            let handle = PluginHandle::new(&name, plugin_root, Arc::clone(&host))?;
            let preset = preset.as_deref().map(PluginPreset::guess).transpose()?;
            if !plugin_chain.append(handle, preset) {
                return Err(Error::InvalidChain(format!(
                    "more than {} plugins",
                    MAX_CHAIN_LENGTH
                )));
            }
        }
        Ok(plugin_chain)
    }

    pub fn host(&self) -> &Arc<HostContext> {
        &self.host
    }

    /// Adds a plugin at the end. Refuses once the chain is full.
    pub fn append(&mut self, handle: PluginHandle, preset: Option<PluginPreset>) -> bool {
        if self.entries.len() >= MAX_CHAIN_LENGTH {
            error!(
                "Plugin chain is full ({} plugins), not adding '{}'",
                MAX_CHAIN_LENGTH,
                handle.name()
            );
            return false;
        }
        let name = handle.name().to_string();
        self.entries.push(ChainEntry {
            handle,
            preset,
            audio_timer: TaskTimer::new(name.clone(), "Audio Processing"),
            midi_timer: TaskTimer::new(name, "MIDI Processing"),
        });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn handle(&self, index: usize) -> Option<&PluginHandle> {
        self.entries.get(index).map(|entry| &entry.handle)
    }

    pub fn handle_mut(&mut self, index: usize) -> Option<&mut PluginHandle> {
        self.entries.get_mut(index).map(|entry| &mut entry.handle)
    }

    pub fn handles(&self) -> impl Iterator<Item = &PluginHandle> {
        self.entries.iter().map(|entry| &entry.handle)
    }

    /// Opens every plugin and applies bound presets.
    ///
    /// Any failure aborts the whole chain: a plugin that cannot be opened,
    /// an instrument anywhere but first, a plugin of unknown or unsupported
    /// type, or a preset that does not fit or fails to load.
    pub fn initialize(&mut self) -> Result<()> {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let name = entry.handle.name().to_string();
            if let Err(e) = entry.handle.open() {
                error!("Plugin '{}' could not be opened: {}", name, e);
                return Err(e);
            }

            match entry.handle.plugin_type() {
                PluginType::Effect => {}
                PluginType::Instrument if index == 0 => {}
                PluginType::Instrument => {
                    error!("Instrument '{}' must be the first plugin in the chain", name);
                    return Err(Error::InvalidChain(format!(
                        "instrument '{}' at position {}; instruments must come first",
                        name, index
                    )));
                }
                kind @ (PluginType::Unknown | PluginType::Unsupported) => {
                    error!("Plugin '{}' has {} type", name, kind);
                    return Err(Error::UnsupportedPluginType {
                        name,
                        kind: kind.to_string(),
                    });
                }
            }

            if let Some(mut preset) = entry.preset.take() {
                if !preset.is_compatible(&entry.handle) {
                    error!(
                        "Preset '{}' cannot be used with plugin '{}'",
                        preset.name(),
                        name
                    );
                    return Err(Error::IncompatiblePreset {
                        preset: preset.name().to_string(),
                        plugin: name,
                    });
                }
                preset.open()?;
                preset.load(&mut entry.handle)?;
            }
            info!("Plugin '{}' ready as {}", name, entry.handle.plugin_type());
        }
        Ok(())
    }

    /// Opens every plugin without type checks and logs what it reports.
    /// Used for `--display-info`, which also has to work on shell modules.
    pub fn inspect(&mut self) -> Result<()> {
        for entry in self.entries.iter_mut() {
            if !entry.handle.is_open() {
                entry.handle.open()?;
            }
            entry.handle.display_info();
        }
        Ok(())
    }

    /// True when the first plugin is an instrument.
    pub fn starts_with_instrument(&self) -> bool {
        self.handle(0)
            .is_some_and(|handle| handle.plugin_type() == PluginType::Instrument)
    }

    /// Longest tail requested by any plugin.
    pub fn maximum_tail_time_ms(&self) -> u64 {
        self.handles()
            .map(|handle| handle.get_setting(PluginSetting::TailTimeMs))
            .max()
            .unwrap_or(0)
    }

    /// Makes `snapshot` visible to plugins asking for the time.
    pub fn publish_transport(&self, snapshot: TransportSnapshot) {
        self.host.publish_transport(snapshot);
    }

    /// Runs one block through every plugin in order.
    ///
    /// On return `output` holds the last stage's output. `input` is reused
    /// as the next stage's input and is overwritten for chains longer than
    /// one plugin.
    pub fn process_audio(&mut self, input: &mut SampleBuffer, output: &mut SampleBuffer) {
        let last = self.entries.len().saturating_sub(1);
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let inputs = entry.handle.get_setting(PluginSetting::NumInputs) as usize;
            let outputs = entry.handle.get_setting(PluginSetting::NumOutputs) as usize;
            input.expand_channels(inputs);
            output.expand_channels(outputs.max(inputs));
            output.clear();

            entry.audio_timer.start();
            entry.handle.process_audio(input, output);
            entry.audio_timer.stop();

            if index != last {
                input.copy_from(output);
            }
        }
    }

    /// MIDI goes to the first plugin only.
    pub fn process_midi(&mut self, events: &[MidiEvent]) {
        let Some(entry) = self.entries.first_mut() else {
            return;
        };
        if events.is_empty() {
            return;
        }
        if entry.handle.plugin_type() != PluginType::Instrument {
            tracing::debug!(
                "Sending {} MIDI events to effect '{}'",
                events.len(),
                entry.handle.name()
            );
        }
        entry.midi_timer.start();
        entry.handle.process_midi(events);
        entry.midi_timer.stop();
    }

    /// Sets a parameter on the plugin at `index`.
    pub fn set_parameter(&mut self, index: usize, parameter: usize, value: f32) -> Result<()> {
        let handle = self
            .handle_mut(index)
            .ok_or_else(|| Error::InvalidChain(format!("no plugin at position {}", index)))?;
        handle.set_parameter(parameter, value)?;
        info!(
            "Set parameter {} of '{}' to {}",
            parameter,
            handle.name(),
            value
        );
        Ok(())
    }

    /// Audio and MIDI timers for every plugin, in chain order.
    pub fn timers(&self) -> impl Iterator<Item = &TaskTimer> {
        self.entries
            .iter()
            .flat_map(|entry| [&entry.audio_timer, &entry.midi_timer])
    }

    /// Closes every plugin in order.
    pub fn shutdown(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.audio_timer.stop();
            entry.midi_timer.stop();
            if entry.handle.is_open() {
                entry.handle.close();
            }
            if entry.preset.is_some() {
                warn!("Preset for '{}' was never loaded", entry.handle.name());
                entry.preset = None;
            }
        }
    }
}

impl Drop for PluginChain {
    fn drop(&mut self) {
        self.shutdown();
    }
}
