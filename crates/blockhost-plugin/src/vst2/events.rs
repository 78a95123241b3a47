//! MIDI event batches in `VstEvents` form.

use super::abi::{VstEvent, VstEvents, VstMidiEvent, MIDI_EVENT_TYPE};
use blockhost_midi::{MidiEvent, MidiMessage};
use smallvec::SmallVec;
use std::mem::size_of;
use tracing::warn;

/// Stack-first storage for one block's worth of events.
pub type MidiEventVec = SmallVec<[VstMidiEvent; 32]>;

/// Puts note-offs ahead of everything else, keeping the relative order
/// inside each group. Some instruments drop a note that is released and
/// re-struck within the same block unless the release arrives first.
pub fn note_offs_first(events: &[MidiEvent]) -> SmallVec<[&MidiEvent; 32]> {
    let (offs, rest): (SmallVec<[&MidiEvent; 32]>, SmallVec<[&MidiEvent; 32]>) =
        events.iter().partition(|event| event.is_note_off());
    offs.into_iter().chain(rest).collect()
}

/// Converts voice events; sysex is refused and meta events are dropped.
pub fn to_vst_events(events: &[MidiEvent]) -> MidiEventVec {
    let mut converted = MidiEventVec::new();
    for event in note_offs_first(events) {
        match &event.message {
            MidiMessage::Voice {
                status,
                data1,
                data2,
            } => converted.push(VstMidiEvent {
                event_type: MIDI_EVENT_TYPE,
                byte_size: size_of::<VstMidiEvent>() as i32,
                delta_frames: event.delta_frames as i32,
                midi_data: [*status, *data1, *data2, 0],
                ..Default::default()
            }),
            MidiMessage::SysEx(_) => {
                warn!("Unsupported feature: sysex events are not passed to plugins");
            }
            MidiMessage::Meta { .. } => {}
        }
    }
    converted
}

/// Owns a `VstEvents` header, its pointer array and the events it points at.
///
/// The header is laid out inside a `usize` buffer so the trailing pointer
/// array can hold any number of entries with correct alignment. Everything
/// lives on the heap, so the block stays valid while the owner moves. Plugins
/// are allowed to hold on to it until the next `effProcessEvents`.
#[derive(Default)]
pub struct EventBuffer {
    words: Vec<usize>,
    events: Vec<VstMidiEvent>,
}

impl EventBuffer {
    const HEADER_WORDS: usize = size_of::<VstEvents>() / size_of::<usize>();

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Replaces the previous batch with `events` and builds a `VstEvents`
    /// view over it.
    ///
    /// The returned pointer stays valid until the next `fill` or `clear`.
    pub fn fill(&mut self, events: MidiEventVec) -> *mut VstEvents {
        self.events.clear();
        self.events.extend(events);
        self.words.clear();
        self.words.resize(Self::HEADER_WORDS + self.events.len(), 0);

        let header = self.words.as_mut_ptr() as *mut VstEvents;
        unsafe {
            (*header).num_events = self.events.len() as i32;
            (*header).reserved = 0;
            let slots = self.words.as_mut_ptr().add(Self::HEADER_WORDS) as *mut *mut VstEvent;
            for (index, event) in self.events.iter_mut().enumerate() {
                *slots.add(index) = event as *mut VstMidiEvent as *mut VstEvent;
            }
        }
        header
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.words.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_offs_first_keeps_group_order() {
        let batch = vec![
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::note_off(0, 0, 62, 0),
            MidiEvent::control_change(0, 0, 7, 90),
            MidiEvent::note_off(0, 0, 64, 0),
        ];
        let ordered: Vec<_> = note_offs_first(&batch).into_iter().cloned().collect();
        assert_eq!(
            ordered,
            vec![
                batch[1].clone(),
                batch[3].clone(),
                batch[0].clone(),
                batch[2].clone()
            ]
        );
    }

    #[test]
    fn test_conversion_skips_sysex_and_meta() {
        let mut on = MidiEvent::note_on(100, 2, 60, 90);
        on.delta_frames = 12;
        let batch = vec![
            MidiEvent::new(0, MidiMessage::SysEx(vec![0x7e, 0x7f])),
            on,
            MidiEvent::new(
                0,
                MidiMessage::Meta {
                    meta_type: 0x51,
                    data: vec![7, 161, 32],
                },
            ),
        ];
        let converted = to_vst_events(&batch);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].midi_data, [0x92, 60, 90, 0]);
        assert_eq!(converted[0].delta_frames, 12);
        assert_eq!(converted[0].byte_size, 32);
    }

    #[test]
    fn test_event_buffer_layout() {
        let events = to_vst_events(&[
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::note_on(0, 0, 64, 100),
            MidiEvent::note_on(0, 0, 67, 100),
        ]);
        let mut buffer = EventBuffer::new();
        let header = buffer.fill(events);
        unsafe {
            assert_eq!((*header).num_events, 3);
            let slots = (*header).events.as_ptr();
            let third = *slots.add(2) as *const VstMidiEvent;
            assert_eq!((*third).midi_data[1], 67);
        }
    }

    #[test]
    fn test_event_buffer_outlives_its_input_and_moves() {
        let mut buffer = EventBuffer::new();
        let header = buffer.fill(to_vst_events(&[MidiEvent::note_on(0, 1, 72, 80)]));
        let moved = Box::new(buffer);
        unsafe {
            let first = *(*header).events.as_ptr() as *const VstMidiEvent;
            assert_eq!((*first).midi_data, [0x91, 72, 80, 0]);
        }
        assert_eq!(moved.len(), 1);
    }
}
