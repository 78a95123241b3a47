//! In-process plugin hosting for blockhost
//!
//! Plugins are either native VST 2.4 modules loaded with `libloading`, or
//! built-ins addressed by an `mrs_` name. Both sit behind [`PluginHandle`]
//! and are run in series by a [`PluginChain`].
//!
//! ## Usage
//!
//! ```ignore
//! use blockhost_core::{SampleBuffer, Settings};
//! use blockhost_plugin::{HostContext, PluginChain};
//!
//! let settings = Settings::default().freeze();
//! let host = HostContext::new(settings);
//!
//! // "name[,preset];name[,preset]..."
//! let mut chain = PluginChain::from_chain_string("Reverb,hall.fxp;mrs_limiter", None, host)?;
//! chain.initialize()?;
//!
//! let mut input = SampleBuffer::new(2, settings.block_size());
//! let mut output = SampleBuffer::new(2, settings.block_size());
//! chain.process_audio(&mut input, &mut output);
//! ```

pub mod error;
pub use error::{Error, LoadStage, Result};

mod id;
pub use id::{id_from_str, id_to_string, split_shell_id};

pub mod vst2;
pub use vst2::{HostContext, Vst2Plugin};

mod internal;
pub use internal::{list_internal_plugins, InternalKind, InternalPlugin, INTERNAL_PREFIX};

pub mod discovery;

mod handle;
pub use handle::{PluginHandle, PluginSetting, PluginType};

mod preset;
pub use preset::{Fxp, FxpContent, PluginPreset, PresetKind};

mod chain;
pub use chain::{parse_chain_string, PluginChain, MAX_CHAIN_LENGTH};

pub use blockhost_midi::MidiEvent;
