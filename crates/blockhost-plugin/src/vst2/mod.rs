//! Native VST 2.4 hosting.
//!
//! The ABI is declared by hand in [`abi`]; modules are loaded with
//! `libloading` and driven entirely in-process.

pub mod abi;
mod events;
pub mod host;
mod plugin;

pub use events::{note_offs_first, to_vst_events, EventBuffer, MidiEventVec};
pub use host::{HostContext, ShellIdSlot, HOST_VST_VERSION};
pub use plugin::{tail_size_to_ms, Vst2Plugin};
