use crate::{MidiTimeline, Result};

/// Producer of a complete [`MidiTimeline`].
///
/// There is no streaming contract: `read_all_events` fills the whole
/// timeline before the first block is processed.
pub trait MidiSource {
    /// Display name, usually the file path.
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<()>;

    fn read_all_events(&mut self, timeline: &mut MidiTimeline) -> Result<()>;
}
