//! MIDI events with absolute sample timestamps.

/// Broad class of a [`MidiEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEventKind {
    Voice,
    SysEx,
    Meta,
}

/// Event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Channel voice message as raw bytes. `data2` is 0 for two-byte messages.
    Voice { status: u8, data1: u8, data2: u8 },
    /// System exclusive payload, without the leading 0xF0.
    SysEx(Vec<u8>),
    /// Meta event type byte and payload.
    Meta { meta_type: u8, data: Vec<u8> },
}

/// A MIDI event positioned on the run's sample timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiEvent {
    /// Absolute position in samples from the start of the run.
    pub timestamp: u64,
    /// Offset from the start of the block containing the event.
    /// Only meaningful after [`extract_range`](crate::MidiTimeline::extract_range).
    pub delta_frames: u32,
    pub message: MidiMessage,
}

impl MidiEvent {
    pub fn new(timestamp: u64, message: MidiMessage) -> Self {
        Self {
            timestamp,
            delta_frames: 0,
            message,
        }
    }

    pub fn voice(timestamp: u64, status: u8, data1: u8, data2: u8) -> Self {
        Self::new(
            timestamp,
            MidiMessage::Voice {
                status,
                data1,
                data2,
            },
        )
    }

    #[inline]
    pub fn note_on(timestamp: u64, channel: u8, note: u8, velocity: u8) -> Self {
        Self::voice(timestamp, 0x90 | (channel & 0x0F), note, velocity)
    }

    #[inline]
    pub fn note_off(timestamp: u64, channel: u8, note: u8, velocity: u8) -> Self {
        Self::voice(timestamp, 0x80 | (channel & 0x0F), note, velocity)
    }

    #[inline]
    pub fn control_change(timestamp: u64, channel: u8, controller: u8, value: u8) -> Self {
        Self::voice(timestamp, 0xB0 | (channel & 0x0F), controller, value)
    }

    pub fn kind(&self) -> MidiEventKind {
        match self.message {
            MidiMessage::Voice { .. } => MidiEventKind::Voice,
            MidiMessage::SysEx(_) => MidiEventKind::SysEx,
            MidiMessage::Meta { .. } => MidiEventKind::Meta,
        }
    }

    /// Status byte for voice events, `None` otherwise.
    pub fn status(&self) -> Option<u8> {
        match self.message {
            MidiMessage::Voice { status, .. } => Some(status),
            _ => None,
        }
    }

    /// True for voice events whose status high nibble is 0x8.
    pub fn is_note_off(&self) -> bool {
        self.status().is_some_and(|status| status >> 4 == 0x8)
    }
}
