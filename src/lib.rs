//! # blockhost - offline plugin batch host
//!
//! Runs a chain of VST2 plugins (or built-ins) over an audio input, driven
//! by an optional MIDI file, as fast as the plugins allow.
//!
//! ## Architecture
//!
//! blockhost is an umbrella crate that coordinates:
//! - **blockhost-core** - Settings, clock, task timers, sample buffers
//! - **blockhost-midi** - MIDI timeline and Standard MIDI File source
//! - **blockhost-plugin** - VST2 hosting, built-ins, presets, plugin chain
//! - **blockhost-io** - WAVE, raw PCM, silence and in-memory audio I/O
//!
//! ## Quick Start
//!
//! ```ignore
//! use blockhost::prelude::*;
//!
//! let settings = Settings::default().freeze();
//! let chain = PluginChain::from_chain_string("mrs_gain;mrs_limiter", None, HostContext::new(settings))?;
//!
//! let mut source = MemorySource::new(samples, 2);
//! let mut sink = MemorySink::new(2);
//! let report = Orchestrator::new(settings, chain).run(&mut source, &mut sink, None, &[])?;
//! ```

/// Re-export of blockhost-core for direct access
pub use blockhost_core as core;
pub use blockhost_io as io;
pub use blockhost_midi as midi;
pub use blockhost_plugin as plugin;

pub use blockhost_core::{Clock, FrozenSettings, ReturnCode, SampleBuffer, Settings, TaskTimer};

mod error;
pub use error::{Error, Result};

mod config;
pub use config::{ParameterSetting, RunConfig, DEFAULT_OUTPUT};

mod report;
pub use report::{ComponentTime, RunReport};

mod orchestrator;
pub use orchestrator::{Orchestrator, RunState};

mod session;
pub use session::{run, RunOutcome};

pub mod prelude {
    pub use crate::{
        Error, Orchestrator, ParameterSetting, Result, RunConfig, RunReport, RunState,
    };
    pub use blockhost_core::{FrozenSettings, ReturnCode, SampleBuffer, Settings};
    pub use blockhost_io::{MemorySink, MemorySource, SampleSink, SampleSource, SilenceSource};
    pub use blockhost_midi::{MidiEvent, MidiFileSource, MidiSource, MidiTimeline};
    pub use blockhost_plugin::{HostContext, PluginChain, PluginHandle, PluginType};
}
