//! MIDI subsystem for blockhost.
//!
//! A [`MidiSource`] fills a [`MidiTimeline`] once, before processing starts.
//! The render loop then pulls one block's worth of events at a time with
//! [`MidiTimeline::extract_range`].

pub mod error;
pub use error::{Error, Result};

mod event;
pub use event::{MidiEvent, MidiEventKind, MidiMessage};

mod timeline;
pub use timeline::MidiTimeline;

mod source;
pub use source::MidiSource;

mod file;
pub use file::MidiFileSource;
